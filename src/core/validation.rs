//! Input validation
//!
//! Two layers: presence of required fields, reported together in one message,
//! and field bounds declared on the payload types with `validator`.

use crate::error::{ApiError, ApiResult};
use validator::Validate;

/// Collects the names of missing required fields
///
/// # Examples
///
/// ```
/// use stockroom::core::validation::MissingFields;
///
/// let mut missing = MissingFields::new();
/// let name = missing.take("name", Some("Acme".to_string()));
/// let sku: Option<String> = missing.take("SKU", None);
///
/// assert_eq!(name.as_deref(), Some("Acme"));
/// assert!(sku.is_none());
/// assert!(missing.finish().is_err());
/// ```
#[derive(Debug, Default)]
pub struct MissingFields {
    names: Vec<&'static str>,
}

impl MissingFields {
    pub fn new() -> Self {
        MissingFields::default()
    }

    /// Pass `value` through, recording `name` if it is absent
    pub fn take<T>(&mut self, name: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.names.push(name);
        }
        value
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Fail with a message naming every missing field
    pub fn finish(self) -> ApiResult<()> {
        if self.names.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(format!(
                "Missing required fields: {}",
                self.names.join(", ")
            )))
        }
    }
}

/// Run the payload's declared field checks
pub fn check<T: Validate>(input: &T) -> ApiResult<()> {
    input.validate().map_err(|errors| {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();
        ApiError::Validation(format!("Invalid value for: {}", fields.join(", ")))
    })
}
