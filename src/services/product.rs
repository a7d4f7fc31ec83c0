//! Product service
//!
//! Reads are open to any signed-in principal, writes are admin-only. Every
//! response embeds the supplier; single-record reads embed the full contact.

use crate::core::iam::{Action, PolicyEngine, Resource};
use crate::core::ids::RecordId;
use crate::core::integrity::{ensure_unique_sku, resolve_foreign_key};
use crate::core::models::{
    clean, Detail, Populated, Product, ProductInput, ProductView, Reference,
};
use crate::core::store::{Database, Query};
use crate::core::validation::{self, MissingFields};
use crate::error::{ApiError, ApiResult};
use crate::services::{gone, path_id, Message, RequestContext};
use chrono::Utc;
use tracing::info;

const NOT_FOUND: &str = "Product";

#[derive(Clone)]
pub struct ProductService {
    db: Database,
    policy: PolicyEngine,
}

impl ProductService {
    pub fn new(db: Database) -> Self {
        ProductService {
            db,
            policy: PolicyEngine::new(),
        }
    }

    pub async fn list(&self, ctx: &RequestContext) -> ApiResult<Vec<ProductView>> {
        self.policy
            .authorize(ctx.principal(), Resource::Product, Action::List)?;
        let products = self.db.products.find(Query::all()).await?;

        let mut views = Vec::with_capacity(products.len());
        for product in products {
            views.push(self.view(product, Detail::Brief).await?);
        }
        Ok(views)
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> ApiResult<ProductView> {
        self.policy
            .authorize(ctx.principal(), Resource::Product, Action::Read)?;
        let id = path_id(id, NOT_FOUND)?;
        let product = self.load(&id).await?;
        self.view(product, Detail::Full).await
    }

    pub async fn create(&self, ctx: &RequestContext, input: ProductInput) -> ApiResult<ProductView> {
        self.policy
            .authorize(ctx.principal(), Resource::Product, Action::Create)?;
        validation::check(&input)?;

        let mut missing = MissingFields::new();
        let name = missing.take("name", clean(input.name.clone()));
        let sku = missing.take("SKU", clean(input.sku.clone()));
        let supplier_ref = missing.take("supplierId", clean(input.supplier_id.clone()));
        let price = missing.take("price", input.price);
        missing.finish()?;
        let sku = sku.unwrap_or_default();

        let supplier = resolve_foreign_key(
            &*self.db.suppliers,
            &supplier_ref.unwrap_or_default(),
            "Supplier",
        )
        .await?;
        ensure_unique_sku(&*self.db.products, &sku, None).await?;

        let now = Utc::now();
        let product = self
            .db
            .products
            .insert(Product {
                id: RecordId::new(),
                name: name.unwrap_or_default(),
                sku,
                supplier_id: supplier.id,
                quantity: input.quantity.unwrap_or(0),
                price: price.unwrap_or_default(),
                description: clean(input.description),
                category: clean(input.category),
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!("Created product {} ({})", product.id, product.sku);

        Ok(Populated::new(
            product,
            "supplierId",
            Reference::Resolved(supplier.summary(Detail::Brief)),
        ))
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: ProductInput,
    ) -> ApiResult<ProductView> {
        self.policy
            .authorize(ctx.principal(), Resource::Product, Action::Update)?;
        let id = path_id(id, NOT_FOUND)?;
        validation::check(&input)?;

        let mut product = self.load(&id).await?;

        if let Some(raw) = clean(input.supplier_id.clone()) {
            let supplier =
                resolve_foreign_key(&*self.db.suppliers, &raw, "Supplier").await?;
            product.supplier_id = supplier.id;
        }
        if let Some(sku) = clean(input.sku.clone()) {
            if sku != product.sku {
                ensure_unique_sku(&*self.db.products, &sku, Some(product.id)).await?;
                product.sku = sku;
            }
        }
        product.apply(&input);
        product.touch(Utc::now());

        let product = self
            .db
            .products
            .replace(product)
            .await
            .map_err(gone(NOT_FOUND))?;
        self.view(product, Detail::Brief).await
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> ApiResult<Message> {
        self.policy
            .authorize(ctx.principal(), Resource::Product, Action::Delete)?;
        let id = path_id(id, NOT_FOUND)?;
        self.db
            .products
            .remove(&id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        info!("Deleted product {}", id);
        Ok(Message::new("Product deleted successfully"))
    }

    async fn load(&self, id: &RecordId) -> ApiResult<Product> {
        self.db
            .products
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))
    }

    async fn view(&self, product: Product, detail: Detail) -> ApiResult<ProductView> {
        let reference = match self.db.suppliers.get(&product.supplier_id).await? {
            Some(supplier) => Reference::Resolved(supplier.summary(detail)),
            None => Reference::Dangling(product.supplier_id),
        };
        Ok(Populated::new(product, "supplierId", reference))
    }
}
