//! Order records

use super::{clean, clean_email, Populated, ProductSummary};
use crate::core::ids::RecordId;
use crate::core::store::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Fulfilment status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid status: {}", s))
    }
}

/// A customer order; owned by the principal that placed it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// Owning principal
    pub user_id: RecordId,
    pub product_id: RecordId,
    pub quantity: i64,
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub shipping_address: String,
    /// Unit price at the time of the last product/quantity change, times quantity
    pub total_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Apply customer-facing fields present in `input`.
    ///
    /// Product, quantity and status are left to the caller, which re-prices
    /// and validates them.
    pub fn apply(&mut self, input: &OrderInput) {
        if let Some(name) = clean(input.customer_name.clone()) {
            self.customer_name = name;
        }
        if let Some(email) = clean_email(input.customer_email.clone()) {
            self.customer_email = Some(email);
        }
        if let Some(phone) = clean(input.customer_phone.clone()) {
            self.customer_phone = Some(phone);
        }
        if let Some(address) = clean(input.shipping_address.clone()) {
            self.shipping_address = address;
        }
        if let Some(notes) = clean(input.notes.clone()) {
            self.notes = Some(notes);
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Document for Order {
    const COLLECTION: &'static str = "orders";

    fn id(&self) -> RecordId {
        self.id
    }

    fn owner(&self) -> Option<RecordId> {
        Some(self.user_id)
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Order joined with its product
pub type OrderView = Populated<Order, ProductSummary>;

/// Total for `quantity` units at `unit_price`
pub fn total_amount(unit_price: f64, quantity: i64) -> f64 {
    unit_price * quantity as f64
}

/// Create/update payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub product_id: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: Option<i64>,
    pub status: Option<String>,
    pub customer_name: Option<String>,
    #[validate(email)]
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
}

/// Partial status update payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusPatch {
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("lost".parse::<OrderStatus>().is_err());
        assert!("Pending".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_total_amount() {
        assert_eq!(total_amount(25.0, 3), 75.0);
        assert_eq!(total_amount(25.0, 5), 125.0);
        assert_eq!(total_amount(0.0, 9), 0.0);
    }
}
