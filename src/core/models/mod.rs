//! Record types, request payloads and populated views
//!
//! Records are what the store holds. Payloads (`*Input`, `*Patch`) are what
//! callers send; every field is optional so that create and update can share
//! them and report missing fields themselves. Views join a record with a
//! summary of the record it references.

mod inventory;
mod order;
mod product;
mod supplier;
mod user;

pub use inventory::{Inventory, InventoryInput, InventoryView, StockPatch};
pub use order::{total_amount, Order, OrderInput, OrderStatus, OrderView, StatusPatch};
pub use product::{Product, ProductInput, ProductSummary, ProductView};
pub use supplier::{Supplier, SupplierInput, SupplierSummary};
pub use user::{LoginInput, PasswordHash, RegisterInput, User, UserProfile};

use crate::core::ids::RecordId;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};

/// How much of a referenced record a view embeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detail {
    /// Listings and write responses
    Brief,
    /// Single-record reads
    Full,
}

/// A reference field after population
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reference<R> {
    /// Referenced record found
    Resolved(R),
    /// Referenced record gone; the raw id is kept
    Dangling(RecordId),
}

impl<R> Reference<R> {
    pub fn resolved(&self) -> Option<&R> {
        match self {
            Reference::Resolved(r) => Some(r),
            Reference::Dangling(_) => None,
        }
    }
}

/// A record with one reference field replaced by its populated form
///
/// Serialises as the record itself, except that `field` carries the
/// referenced summary instead of the bare id.
#[derive(Debug, Clone, PartialEq)]
pub struct Populated<D, R> {
    pub doc: D,
    pub field: &'static str,
    pub reference: Reference<R>,
}

impl<D, R> Populated<D, R> {
    pub fn new(doc: D, field: &'static str, reference: Reference<R>) -> Self {
        Populated {
            doc,
            field,
            reference,
        }
    }
}

impl<D: Serialize, R: Serialize> Serialize for Populated<D, R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = serde_json::to_value(&self.doc).map_err(S::Error::custom)?;
        let reference = serde_json::to_value(&self.reference).map_err(S::Error::custom)?;
        match value.as_object_mut() {
            Some(map) => {
                map.insert(self.field.to_string(), reference);
            }
            None => return Err(S::Error::custom("populated record is not an object")),
        }
        value.serialize(serializer)
    }
}

/// Trim a text field, treating blank input as absent
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// [`clean`] plus lower-casing, for email addresses
pub fn clean_email(value: Option<String>) -> Option<String> {
    clean(value).map(|v| v.to_lowercase())
}
