//! Supplier records

use super::{clean, clean_email, Detail};
use crate::core::ids::RecordId;
use crate::core::store::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A supplier; admin-only, no owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub name: String,
    pub contact: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Supplier {
    /// Summary embedded in product views
    pub fn summary(&self, detail: Detail) -> SupplierSummary {
        let full = detail == Detail::Full;
        SupplierSummary {
            id: self.id,
            name: self.name.clone(),
            contact: self.contact.clone(),
            address: full.then(|| self.address.clone()),
            email: if full { self.email.clone() } else { None },
            phone: if full { self.phone.clone() } else { None },
        }
    }

    /// Apply the fields present in `input`
    pub fn apply(&mut self, input: SupplierInput) {
        if let Some(name) = clean(input.name) {
            self.name = name;
        }
        if let Some(contact) = clean(input.contact) {
            self.contact = contact;
        }
        if let Some(address) = clean(input.address) {
            self.address = address;
        }
        if let Some(email) = clean_email(input.email) {
            self.email = Some(email);
        }
        if let Some(phone) = clean(input.phone) {
            self.phone = Some(phone);
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Document for Supplier {
    const COLLECTION: &'static str = "suppliers";

    fn id(&self) -> RecordId {
        self.id
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Supplier as embedded in a product view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierSummary {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub name: String,
    pub contact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Create/update payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SupplierInput {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
}
