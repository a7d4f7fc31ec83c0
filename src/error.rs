//! Error types for API operations
//!
//! Every service operation returns [`ApiResult`]; no fault leaves a service
//! untyped. Each variant maps onto exactly one HTTP status, and only
//! [`ApiError::Internal`] hides its detail from the caller.

use crate::core::iam::Denial;
use crate::core::store::StoreError;
use thiserror::Error;
use tracing::{debug, error};

/// API operation result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Generic message reported for every internal failure
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// API operation errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// No session, or the session is not valid
    #[error("{0}")]
    Unauthenticated(String),

    /// Session refers to a user that no longer exists
    #[error("User not found")]
    UserGone,

    /// Authenticated but denied by policy
    #[error("{0}")]
    Forbidden(String),

    /// Absent, or present but invisible to this principal
    #[error("{0}")]
    NotFound(String),

    /// Missing or malformed input, or a violated uniqueness precondition
    #[error("{0}")]
    Validation(String),

    /// A foreign key did not resolve
    #[error("{0}")]
    InvalidReference(String),

    /// Request body over the configured limit
    #[error("Request body too large")]
    PayloadTooLarge,

    /// Unexpected store or infrastructure fault
    #[error("Internal failure: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status code for this error
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Unauthenticated(_) | ApiError::UserGone => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Validation(_) | ApiError::InvalidReference(_) => 400,
            ApiError::PayloadTooLarge => 413,
            ApiError::Internal(_) => 500,
        }
    }

    /// Message safe to send to the caller
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Wrap an unexpected fault, logging its full detail
    pub fn internal(context: &str, detail: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, detail);
        ApiError::Internal(format!("{}: {}", context, detail))
    }

    pub fn unauthenticated() -> Self {
        ApiError::Unauthenticated("Authentication required".to_string())
    }

    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{} not found", what))
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => ApiError::unauthenticated(),
            Denial::Forbidden(msg) => ApiError::Forbidden(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { message, .. } => ApiError::Validation(message),
            StoreError::Missing { collection, id } => {
                debug!("{} {} vanished before write", collection, id);
                ApiError::NotFound("Record not found".to_string())
            }
            other => ApiError::internal("Store failure", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::RecordId;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::unauthenticated().status(), 401);
        assert_eq!(ApiError::UserGone.status(), 401);
        assert_eq!(ApiError::Forbidden("no".into()).status(), 403);
        assert_eq!(ApiError::not_found("Order").status(), 404);
        assert_eq!(ApiError::Validation("bad".into()).status(), 400);
        assert_eq!(ApiError::InvalidReference("gone".into()).status(), 400);
        assert_eq!(ApiError::PayloadTooLarge.status(), 413);
        assert_eq!(ApiError::Internal("boom".into()).status(), 500);
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = ApiError::Internal("connection reset by peer".into());
        assert_eq!(err.public_message(), INTERNAL_MESSAGE);
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_denial_keeps_401_and_403_apart() {
        let unauth: ApiError = Denial::Unauthenticated.into();
        let forbidden: ApiError = Denial::Forbidden("admin access required".into()).into();
        assert_eq!(unauth.status(), 401);
        assert_eq!(forbidden.status(), 403);
        assert_eq!(forbidden.public_message(), "admin access required");
    }

    #[test]
    fn test_duplicate_key_maps_to_validation() {
        let err: ApiError = StoreError::DuplicateKey {
            index: "products.sku",
            message: "SKU already exists".into(),
        }
        .into();
        assert_eq!(err.status(), 400);
        assert_eq!(err.public_message(), "SKU already exists");
    }

    #[test]
    fn test_missing_record_maps_to_not_found() {
        let err: ApiError = StoreError::Missing {
            collection: "orders",
            id: RecordId::new(),
        }
        .into();
        assert_eq!(err.status(), 404);

        let err: ApiError = StoreError::Unavailable("disk gone".into()).into();
        assert_eq!(err.status(), 500);
    }
}
