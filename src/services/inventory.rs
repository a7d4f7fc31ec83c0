//! Inventory service
//!
//! Records are owner-scoped. Listings and by-product lookups are narrowed to
//! the caller's records unless the caller is an admin; single-record access to
//! someone else's record answers 404. The low-stock report is the exception:
//! it spans every owner.

use crate::core::iam::{Action, PolicyEngine, Resource};
use crate::core::ids::RecordId;
use crate::core::integrity::{ensure_single_inventory, resolve_foreign_key};
use crate::core::models::{
    clean, Detail, Inventory, InventoryInput, InventoryView, Populated, Reference, StockPatch,
};
use crate::core::store::{Database, Query};
use crate::core::validation::{self, MissingFields};
use crate::error::{ApiError, ApiResult};
use crate::services::{gone, hide, path_id, product_reference, Message, RequestContext};
use chrono::Utc;
use tracing::{debug, info};

const NOT_FOUND: &str = "Inventory item";

#[derive(Clone)]
pub struct InventoryService {
    db: Database,
    policy: PolicyEngine,
}

impl InventoryService {
    pub fn new(db: Database) -> Self {
        InventoryService {
            db,
            policy: PolicyEngine::new(),
        }
    }

    /// The caller's records, or all records for an admin
    pub async fn list(&self, ctx: &RequestContext) -> ApiResult<Vec<InventoryView>> {
        let grant = self
            .policy
            .authorize(ctx.principal(), Resource::Inventory, Action::List)?;
        let records = self.db.inventory.find(Query::scoped(grant.scope())).await?;
        self.views(records, Detail::Brief).await
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> ApiResult<InventoryView> {
        let grant = self
            .policy
            .authorize(ctx.principal(), Resource::Inventory, Action::Read)?;
        let id = path_id(id, NOT_FOUND)?;
        let record = self.load(&id).await?;
        grant.check_owner(&record.user_id).map_err(hide(NOT_FOUND))?;
        self.view(record, Detail::Full).await
    }

    /// The record held for a product, within the caller's scope
    pub async fn by_product(
        &self,
        ctx: &RequestContext,
        product_id: &str,
    ) -> ApiResult<InventoryView> {
        let grant = self
            .policy
            .authorize(ctx.principal(), Resource::Inventory, Action::FindBy)?;
        let not_found = || ApiError::NotFound("Inventory item not found for this product".into());
        let product_id = RecordId::parse(product_id).ok_or_else(not_found)?;

        let record = self
            .db
            .inventory
            .find_one(
                Query::scoped(grant.scope())
                    .filter(move |i: &Inventory| i.product_id == product_id),
            )
            .await?
            .ok_or_else(not_found)?;
        self.view(record, Detail::Full).await
    }

    /// Create a record owned by the caller
    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: InventoryInput,
    ) -> ApiResult<InventoryView> {
        let grant = self
            .policy
            .authorize(ctx.principal(), Resource::Inventory, Action::Create)?;
        validation::check(&input)?;

        let mut missing = MissingFields::new();
        let product_ref = missing.take("productId", clean(input.product_id.clone()));
        let available = missing.take("availableStock", input.available_stock);
        missing.finish()?;

        let product = resolve_foreign_key(
            &*self.db.products,
            &product_ref.unwrap_or_default(),
            "Product",
        )
        .await?;
        let owner = grant.principal().id;
        ensure_single_inventory(&*self.db.inventory, product.id, owner, None).await?;

        let record = self
            .db
            .inventory
            .insert(Inventory {
                id: RecordId::new(),
                product_id: product.id,
                available_stock: available.unwrap_or_default(),
                reserved_stock: input.reserved_stock.unwrap_or(0),
                minimum_stock: input.minimum_stock.unwrap_or(0),
                maximum_stock: input.maximum_stock,
                location: clean(input.location),
                notes: clean(input.notes),
                user_id: owner,
                last_updated: Utc::now(),
            })
            .await?;
        info!(
            "Created inventory {} for product {} owned by {}",
            record.id, record.product_id, owner
        );

        Ok(Populated::new(
            record,
            "productId",
            Reference::Resolved(product.summary(Detail::Brief)),
        ))
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: InventoryInput,
    ) -> ApiResult<InventoryView> {
        let grant = self
            .policy
            .authorize(ctx.principal(), Resource::Inventory, Action::Update)?;
        let id = path_id(id, NOT_FOUND)?;
        let mut record = self.load(&id).await?;
        grant.check_owner(&record.user_id).map_err(hide(NOT_FOUND))?;
        validation::check(&input)?;

        if let Some(raw) = clean(input.product_id.clone()) {
            let product = resolve_foreign_key(&*self.db.products, &raw, "Product").await?;
            if product.id != record.product_id {
                ensure_single_inventory(
                    &*self.db.inventory,
                    product.id,
                    record.user_id,
                    Some(record.id),
                )
                .await?;
                record.product_id = product.id;
            }
        }
        record.apply(&input);
        record.touch(Utc::now());

        let record = self
            .db
            .inventory
            .replace(record)
            .await
            .map_err(gone(NOT_FOUND))?;
        self.view(record, Detail::Brief).await
    }

    /// Set available and/or reserved stock
    pub async fn patch_stock(
        &self,
        ctx: &RequestContext,
        id: &str,
        patch: StockPatch,
    ) -> ApiResult<InventoryView> {
        let grant = self
            .policy
            .authorize(ctx.principal(), Resource::Inventory, Action::Patch)?;
        let id = path_id(id, NOT_FOUND)?;
        let mut record = self.load(&id).await?;
        grant.check_owner(&record.user_id).map_err(hide(NOT_FOUND))?;

        if patch.is_empty() {
            return Err(ApiError::Validation(
                "At least one stock field is required".to_string(),
            ));
        }
        validation::check(&patch)?;

        record.apply_stock(&patch);
        record.touch(Utc::now());
        debug!(
            "Stock for {}: available={} reserved={}",
            record.id, record.available_stock, record.reserved_stock
        );

        let record = self
            .db
            .inventory
            .replace(record)
            .await
            .map_err(gone(NOT_FOUND))?;
        self.view(record, Detail::Brief).await
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> ApiResult<Message> {
        self.policy
            .authorize(ctx.principal(), Resource::Inventory, Action::Delete)?;
        let id = path_id(id, NOT_FOUND)?;
        self.db
            .inventory
            .remove(&id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        info!("Deleted inventory {}", id);
        Ok(Message::new("Inventory item deleted successfully"))
    }

    /// Every record at or below its minimum, across all owners
    pub async fn low_stock(&self, ctx: &RequestContext) -> ApiResult<Vec<InventoryView>> {
        let grant = self
            .policy
            .authorize(ctx.principal(), Resource::Inventory, Action::LowStock)?;
        let records = self
            .db
            .inventory
            .find(Query::scoped(grant.scope()).filter(Inventory::is_low_stock))
            .await?;
        self.views(records, Detail::Brief).await
    }

    async fn load(&self, id: &RecordId) -> ApiResult<Inventory> {
        self.db
            .inventory
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))
    }

    async fn view(&self, record: Inventory, detail: Detail) -> ApiResult<InventoryView> {
        let reference = product_reference(&self.db, record.product_id, detail).await?;
        Ok(Populated::new(record, "productId", reference))
    }

    async fn views(&self, records: Vec<Inventory>, detail: Detail) -> ApiResult<Vec<InventoryView>> {
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            views.push(self.view(record, detail).await?);
        }
        Ok(views)
    }
}
