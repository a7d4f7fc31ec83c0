//! Access policy engine
//!
//! Decides, per request, which records a principal may read or write:
//! - Four decision primitives (authenticated, admin, owner-or-admin, role-or-admin)
//! - A per-resource policy table mapping (resource, action) to a check
//! - Owner scoping of listings, applied before the store is queried

mod engine;
mod policy;

pub use engine::{
    require_admin, require_authenticated, require_owner_or_admin, require_role_or_admin,
    scope_for, Decision, Denial, Grant, PolicyEngine, Scope,
};
pub use policy::{requirement, Action, PolicyError, Principal, Requirement, Resource, Role};

#[cfg(test)]
mod tests;
