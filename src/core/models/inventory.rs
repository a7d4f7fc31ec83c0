//! Inventory records
//!
//! Each record belongs to exactly one principal, and each principal holds at
//! most one record per product.

use super::{clean, Populated, ProductSummary};
use crate::core::ids::RecordId;
use crate::core::store::{Document, UniqueKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub product_id: RecordId,
    pub available_stock: i64,
    pub reserved_stock: i64,
    pub minimum_stock: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Owning principal
    pub user_id: RecordId,
    pub last_updated: DateTime<Utc>,
}

impl Inventory {
    /// At or below the configured minimum
    pub fn is_low_stock(&self) -> bool {
        self.available_stock <= self.minimum_stock
    }

    /// Apply the stock and descriptive fields present in `input`.
    ///
    /// `productId` is left to the caller.
    pub fn apply(&mut self, input: &InventoryInput) {
        if let Some(available) = input.available_stock {
            self.available_stock = available;
        }
        if let Some(reserved) = input.reserved_stock {
            self.reserved_stock = reserved;
        }
        if let Some(minimum) = input.minimum_stock {
            self.minimum_stock = minimum;
        }
        if let Some(maximum) = input.maximum_stock {
            self.maximum_stock = Some(maximum);
        }
        if let Some(location) = clean(input.location.clone()) {
            self.location = Some(location);
        }
        if let Some(notes) = clean(input.notes.clone()) {
            self.notes = Some(notes);
        }
    }

    pub fn apply_stock(&mut self, patch: &StockPatch) {
        if let Some(available) = patch.available_stock {
            self.available_stock = available;
        }
        if let Some(reserved) = patch.reserved_stock {
            self.reserved_stock = reserved;
        }
    }

    /// Refresh `lastUpdated`; runs before every save
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = now;
    }
}

impl Document for Inventory {
    const COLLECTION: &'static str = "inventory";

    fn id(&self) -> RecordId {
        self.id
    }

    fn owner(&self) -> Option<RecordId> {
        Some(self.user_id)
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey {
            index: "inventory.product_owner",
            value: format!("{}:{}", self.product_id, self.user_id),
            message: "Inventory already exists for this product",
        }]
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

/// Inventory joined with its product
pub type InventoryView = Populated<Inventory, ProductSummary>;

/// Create/update payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InventoryInput {
    pub product_id: Option<String>,
    #[validate(range(min = 0))]
    pub available_stock: Option<i64>,
    #[validate(range(min = 0))]
    pub reserved_stock: Option<i64>,
    #[validate(range(min = 0))]
    pub minimum_stock: Option<i64>,
    #[validate(range(min = 0))]
    pub maximum_stock: Option<i64>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Partial stock update payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StockPatch {
    #[validate(range(min = 0))]
    pub available_stock: Option<i64>,
    #[validate(range(min = 0))]
    pub reserved_stock: Option<i64>,
}

impl StockPatch {
    pub fn is_empty(&self) -> bool {
        self.available_stock.is_none() && self.reserved_stock.is_none()
    }
}
