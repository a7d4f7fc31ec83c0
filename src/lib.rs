//! # Stockroom - Role-Gated Supply-Chain Back Office
//!
//! `stockroom` serves a small JSON API over suppliers, products, inventory and
//! orders, fronted by session-based authentication:
//!
//! - **Access policy**: one table decides, per resource and action, whether a
//!   principal must be signed in, an admin, or the record's owner
//! - **Owner scoping**: inventory and orders belong to the principal that
//!   created them; listings are narrowed before the store lookup
//! - **Integrity checks**: foreign keys resolve and unique keys hold before
//!   any write, with unique indexes enforced by the store itself
//! - **Transport**: hyper 1 server with cookie sessions and static pages
//!
//! ## Quick Start
//!
//! ```rust
//! use stockroom::core::iam::{Principal, Role};
//! use stockroom::core::ids::RecordId;
//! use stockroom::core::models::SupplierInput;
//! use stockroom::core::store::Database;
//! use stockroom::services::{RequestContext, SupplierService};
//!
//! # tokio_test::block_on(async {
//! let suppliers = SupplierService::new(Database::in_memory());
//! let admin = RequestContext::authenticated(Principal::new(RecordId::new(), "root", Role::Admin));
//!
//! let acme = suppliers
//!     .create(
//!         &admin,
//!         SupplierInput {
//!             name: Some("Acme".into()),
//!             contact: Some("Wile".into()),
//!             address: Some("1 Desert Rd".into()),
//!             ..Default::default()
//!         },
//!     )
//!     .await
//!     .unwrap();
//! assert_eq!(suppliers.list(&admin).await.unwrap(), vec![acme]);
//! # });
//! ```
//!
//! ## Serving
//!
//! ```rust,no_run
//! use stockroom::{App, ServerConfig};
//!
//! # fn main() -> Result<(), stockroom::ConfigError> {
//! let app = App::in_memory(ServerConfig::load(None)?)?;
//! // hand `app.handle(request)` to a hyper connection per client
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod http;
pub mod services;

pub use crate::config::{ConfigError, ServerConfig};
pub use crate::core::iam::{Action, Denial, PolicyEngine, Principal, Resource, Role};
pub use crate::core::ids::RecordId;
pub use crate::error::{ApiError, ApiResult};
pub use crate::http::App;
