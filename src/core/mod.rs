//! Engine-level modules: identifiers, access policy, storage, records,
//! identity resolution and the integrity checks run before writes.

pub mod iam;
pub mod identity;
pub mod ids;
pub mod integrity;
pub mod models;
pub mod store;
pub mod validation;
