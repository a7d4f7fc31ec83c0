//! Cross-reference integrity checks
//!
//! Pre-write guards: foreign keys must resolve and uniqueness must hold before
//! a write is attempted. A failed check is a 400, never a 500. The uniqueness
//! checks only reject early; the store's unique indexes settle races.

use crate::core::ids::RecordId;
use crate::core::models::{Inventory, Product};
use crate::core::store::{Collection, Document, Query};
use crate::error::{ApiError, ApiResult};
use tracing::debug;

/// Resolve a foreign key given as raw text
///
/// `label` names the referenced type in the error ("Supplier not found").
pub async fn resolve_foreign_key<D: Document>(
    collection: &dyn Collection<D>,
    raw: &str,
    label: &str,
) -> ApiResult<D> {
    let id = RecordId::parse(raw).ok_or_else(|| {
        debug!("Malformed {} reference: {:?}", D::COLLECTION, raw);
        ApiError::InvalidReference(format!("{} not found", label))
    })?;
    resolve_id(collection, &id, label).await
}

/// Resolve an already-parsed foreign key
pub async fn resolve_id<D: Document>(
    collection: &dyn Collection<D>,
    id: &RecordId,
    label: &str,
) -> ApiResult<D> {
    match collection.get(id).await? {
        Some(doc) => Ok(doc),
        None => {
            debug!("Dangling {} reference: {}", D::COLLECTION, id);
            Err(ApiError::InvalidReference(format!("{} not found", label)))
        }
    }
}

/// Reject a SKU already used by another product
pub async fn ensure_unique_sku(
    products: &dyn Collection<Product>,
    sku: &str,
    exclude: Option<RecordId>,
) -> ApiResult<()> {
    let sku = sku.to_string();
    let clash = products
        .find_one(Query::all().filter(move |p: &Product| {
            p.sku == sku && Some(p.id) != exclude
        }))
        .await?;
    match clash {
        Some(_) => Err(ApiError::Validation("SKU already exists".to_string())),
        None => Ok(()),
    }
}

/// Reject a second inventory record for the same (product, owner)
pub async fn ensure_single_inventory(
    inventory: &dyn Collection<Inventory>,
    product_id: RecordId,
    owner: RecordId,
    exclude: Option<RecordId>,
) -> ApiResult<()> {
    let clash = inventory
        .find_one(Query::all().filter(move |i: &Inventory| {
            i.product_id == product_id && i.user_id == owner && Some(i.id) != exclude
        }))
        .await?;
    match clash {
        Some(_) => Err(ApiError::Validation(
            "Inventory already exists for this product".to_string(),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Supplier;
    use crate::core::store::MemoryCollection;
    use chrono::Utc;

    fn supplier() -> Supplier {
        let now = Utc::now();
        Supplier {
            id: RecordId::new(),
            name: "Acme".into(),
            contact: "Wile".into(),
            address: "Desert Rd".into(),
            email: None,
            phone: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn product(sku: &str) -> Product {
        let now = Utc::now();
        Product {
            id: RecordId::new(),
            name: "Anvil".into(),
            sku: sku.into(),
            supplier_id: RecordId::new(),
            quantity: 1,
            price: 10.0,
            description: None,
            category: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn stock(product_id: RecordId, owner: RecordId) -> Inventory {
        Inventory {
            id: RecordId::new(),
            product_id,
            available_stock: 1,
            reserved_stock: 0,
            minimum_stock: 0,
            maximum_stock: None,
            location: None,
            notes: None,
            user_id: owner,
            last_updated: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_resolve_foreign_key() {
        let suppliers: MemoryCollection<Supplier> = MemoryCollection::new();
        let s = supplier();
        suppliers.insert(s.clone()).await.unwrap();

        let found = resolve_foreign_key::<Supplier>(&suppliers, &s.id.to_string(), "Supplier")
            .await
            .unwrap();
        assert_eq!(found, s);
    }

    #[tokio::test]
    async fn test_unresolved_foreign_key_is_invalid_reference() {
        let suppliers: MemoryCollection<Supplier> = MemoryCollection::new();

        let missing = resolve_foreign_key::<Supplier>(&suppliers, &RecordId::new().to_string(), "Supplier")
            .await
            .unwrap_err();
        assert!(matches!(missing, ApiError::InvalidReference(ref m) if m == "Supplier not found"));
        assert_eq!(missing.status(), 400);

        let malformed = resolve_foreign_key::<Supplier>(&suppliers, "zzz", "Supplier")
            .await
            .unwrap_err();
        assert_eq!(malformed.status(), 400);
    }

    #[tokio::test]
    async fn test_store_fault_is_internal() {
        let suppliers: MemoryCollection<Supplier> = MemoryCollection::new();
        suppliers.set_fault(Some("offline"));

        let err = resolve_foreign_key::<Supplier>(&suppliers, &RecordId::new().to_string(), "Supplier")
            .await
            .unwrap_err();
        assert_eq!(err.status(), 500);
    }

    #[tokio::test]
    async fn test_unique_sku_excludes_self() {
        let products: MemoryCollection<Product> = MemoryCollection::new();
        let p = product("SKU-1");
        products.insert(p.clone()).await.unwrap();

        assert!(ensure_unique_sku(&products, "SKU-1", None).await.is_err());
        assert!(ensure_unique_sku(&products, "SKU-1", Some(p.id)).await.is_ok());
        assert!(ensure_unique_sku(&products, "SKU-2", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_single_inventory_per_owner() {
        let inventory: MemoryCollection<Inventory> = MemoryCollection::new();
        let product_id = RecordId::new();
        let alice = RecordId::new();
        let bob = RecordId::new();
        let existing = stock(product_id, alice);
        inventory.insert(existing.clone()).await.unwrap();

        assert!(ensure_single_inventory(&inventory, product_id, alice, None)
            .await
            .is_err());
        assert!(ensure_single_inventory(&inventory, product_id, alice, Some(existing.id))
            .await
            .is_ok());
        assert!(ensure_single_inventory(&inventory, product_id, bob, None)
            .await
            .is_ok());
    }
}
