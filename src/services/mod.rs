//! Resource services
//!
//! One service per resource. Every operation takes the [`RequestContext`]
//! carrying the resolved principal, asks the policy engine first, and only
//! then touches the store. Faults are mapped to [`ApiError`] here and never
//! escape untyped.

mod auth;
mod inventory;
mod order;
mod product;
mod supplier;

pub use auth::{AuthReply, AuthService, SessionInfo};
pub use inventory::InventoryService;
pub use order::OrderService;
pub use product::ProductService;
pub use supplier::SupplierService;

use crate::config::ServerConfig;
use crate::core::iam::{Denial, Principal};
use crate::core::identity::{IdentityResolver, SessionStore};
use crate::core::ids::RecordId;
use crate::core::models::{Detail, ProductSummary, Reference};
use crate::core::store::{Database, StoreError};
use crate::error::{ApiError, ApiResult};
use serde::Serialize;
use std::sync::Arc;

/// Per-request context handed to every service call
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Resolved principal, if any
    pub principal: Option<Principal>,
    /// Raw session token presented with the request
    pub session_token: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        RequestContext::default()
    }

    pub fn authenticated(principal: Principal) -> Self {
        RequestContext {
            principal: Some(principal),
            session_token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.session_token = token;
        self
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}

/// Body of a successful delete or logout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Message {
            message: message.into(),
        }
    }
}

/// Path identifiers that do not parse name no record
pub(crate) fn path_id(raw: &str, what: &str) -> Result<RecordId, ApiError> {
    RecordId::parse(raw).ok_or_else(|| ApiError::not_found(what))
}

/// Ownership denials on owner-scoped records read as absence
pub(crate) fn hide(what: &'static str) -> impl FnOnce(Denial) -> ApiError {
    move |_| ApiError::not_found(what)
}

/// A record removed between load and write reads as absent
pub(crate) fn gone(what: &'static str) -> impl FnOnce(StoreError) -> ApiError {
    move |err| match err {
        StoreError::Missing { .. } => ApiError::not_found(what),
        other => other.into(),
    }
}

/// Product reference as embedded in inventory and order views
pub(crate) async fn product_reference(
    db: &Database,
    product_id: RecordId,
    detail: Detail,
) -> ApiResult<Reference<ProductSummary>> {
    Ok(match db.products.get(&product_id).await? {
        Some(product) => Reference::Resolved(product.summary(detail)),
        None => Reference::Dangling(product_id),
    })
}

/// Every service, wired to one database and session store
#[derive(Clone)]
pub struct Services {
    pub identity: IdentityResolver,
    pub auth: AuthService,
    pub suppliers: SupplierService,
    pub products: ProductService,
    pub inventory: InventoryService,
    pub orders: OrderService,
}

impl Services {
    pub fn new(db: Database, sessions: Arc<dyn SessionStore>, config: &ServerConfig) -> Self {
        Services {
            identity: IdentityResolver::new(sessions.clone(), db.users.clone()),
            auth: AuthService::new(db.users.clone(), sessions, config),
            suppliers: SupplierService::new(db.clone()),
            products: ProductService::new(db.clone()),
            inventory: InventoryService::new(db.clone()),
            orders: OrderService::new(db),
        }
    }
}
