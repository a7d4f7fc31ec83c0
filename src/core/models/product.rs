//! Product records

use super::{clean, Detail, Populated, SupplierSummary};
use crate::core::ids::RecordId;
use crate::core::store::{Document, UniqueKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A catalogue product; written by admins, readable by everyone signed in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "SKU")]
    pub sku: String,
    pub supplier_id: RecordId,
    pub quantity: i64,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Summary embedded in inventory and order views
    pub fn summary(&self, detail: Detail) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            sku: self.sku.clone(),
            price: self.price,
            description: match detail {
                Detail::Full => self.description.clone(),
                Detail::Brief => None,
            },
        }
    }

    /// Apply the plain fields present in `input`.
    ///
    /// `SKU` and `supplierId` are left to the caller, which must check
    /// uniqueness and resolve the supplier first.
    pub fn apply(&mut self, input: &ProductInput) {
        if let Some(name) = clean(input.name.clone()) {
            self.name = name;
        }
        if let Some(quantity) = input.quantity {
            self.quantity = quantity;
        }
        if let Some(price) = input.price {
            self.price = price;
        }
        if let Some(description) = clean(input.description.clone()) {
            self.description = Some(description);
        }
        if let Some(category) = clean(input.category.clone()) {
            self.category = Some(category);
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Document for Product {
    const COLLECTION: &'static str = "products";

    fn id(&self) -> RecordId {
        self.id
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey {
            index: "products.sku",
            value: self.sku.clone(),
            message: "SKU already exists",
        }]
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Product as embedded in inventory and order views
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "SKU")]
    pub sku: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Product joined with its supplier
pub type ProductView = Populated<Product, SupplierSummary>;

/// Create/update payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    #[serde(rename = "SKU")]
    pub sku: Option<String>,
    pub supplier_id: Option<String>,
    #[validate(range(min = 0))]
    pub quantity: Option<i64>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub description: Option<String>,
    pub category: Option<String>,
}
