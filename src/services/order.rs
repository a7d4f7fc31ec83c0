//! Order service
//!
//! Orders are owner-scoped like inventory. The stored `totalAmount` is the
//! product's price at the time of the last product or quantity change.

use crate::core::iam::{Action, PolicyEngine, Resource};
use crate::core::ids::RecordId;
use crate::core::integrity::{resolve_foreign_key, resolve_id};
use crate::core::models::{
    clean, clean_email, total_amount, Detail, Order, OrderInput, OrderStatus, OrderView,
    Populated, Reference, StatusPatch,
};
use crate::core::store::{Database, Query};
use crate::core::validation::{self, MissingFields};
use crate::error::{ApiError, ApiResult};
use crate::services::{gone, hide, path_id, product_reference, Message, RequestContext};
use chrono::Utc;
use tracing::info;

const NOT_FOUND: &str = "Order";

fn parse_status(raw: &str) -> ApiResult<OrderStatus> {
    raw.parse()
        .map_err(|_| ApiError::Validation("Invalid status".to_string()))
}

#[derive(Clone)]
pub struct OrderService {
    db: Database,
    policy: PolicyEngine,
}

impl OrderService {
    pub fn new(db: Database) -> Self {
        OrderService {
            db,
            policy: PolicyEngine::new(),
        }
    }

    pub async fn list(&self, ctx: &RequestContext) -> ApiResult<Vec<OrderView>> {
        let grant = self
            .policy
            .authorize(ctx.principal(), Resource::Order, Action::List)?;
        let orders = self.db.orders.find(Query::scoped(grant.scope())).await?;

        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            views.push(self.view(order, Detail::Brief).await?);
        }
        Ok(views)
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> ApiResult<OrderView> {
        let grant = self
            .policy
            .authorize(ctx.principal(), Resource::Order, Action::Read)?;
        let id = path_id(id, NOT_FOUND)?;
        let order = self.load(&id).await?;
        grant.check_owner(&order.user_id).map_err(hide(NOT_FOUND))?;
        self.view(order, Detail::Full).await
    }

    /// Place an order owned by the caller; status always starts as pending
    pub async fn create(&self, ctx: &RequestContext, input: OrderInput) -> ApiResult<OrderView> {
        let grant = self
            .policy
            .authorize(ctx.principal(), Resource::Order, Action::Create)?;
        validation::check(&input)?;

        let mut missing = MissingFields::new();
        let product_ref = missing.take("productId", clean(input.product_id.clone()));
        let quantity = missing.take("quantity", input.quantity);
        let customer_name = missing.take("customerName", clean(input.customer_name.clone()));
        let shipping_address =
            missing.take("shippingAddress", clean(input.shipping_address.clone()));
        missing.finish()?;

        let product = resolve_foreign_key(
            &*self.db.products,
            &product_ref.unwrap_or_default(),
            "Product",
        )
        .await?;
        let quantity = quantity.unwrap_or_default();

        let now = Utc::now();
        let order = self
            .db
            .orders
            .insert(Order {
                id: RecordId::new(),
                user_id: grant.principal().id,
                product_id: product.id,
                quantity,
                status: OrderStatus::Pending,
                date: now,
                customer_name: customer_name.unwrap_or_default(),
                customer_email: clean_email(input.customer_email),
                customer_phone: clean(input.customer_phone),
                shipping_address: shipping_address.unwrap_or_default(),
                total_amount: total_amount(product.price, quantity),
                notes: clean(input.notes),
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(
            "Created order {} for {} x {} owned by {}",
            order.id, order.quantity, order.product_id, order.user_id
        );

        Ok(Populated::new(
            order,
            "productId",
            Reference::Resolved(product.summary(Detail::Brief)),
        ))
    }

    /// Apply the fields present; re-prices when product or quantity is given
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: OrderInput,
    ) -> ApiResult<OrderView> {
        let grant = self
            .policy
            .authorize(ctx.principal(), Resource::Order, Action::Update)?;
        let id = path_id(id, NOT_FOUND)?;
        let mut order = self.load(&id).await?;
        grant.check_owner(&order.user_id).map_err(hide(NOT_FOUND))?;
        validation::check(&input)?;

        let status = input.status.as_deref().map(parse_status).transpose()?;
        let product_ref = clean(input.product_id.clone());

        if product_ref.is_some() || input.quantity.is_some() {
            let product = match product_ref {
                Some(raw) => resolve_foreign_key(&*self.db.products, &raw, "Product").await?,
                None => resolve_id(&*self.db.products, &order.product_id, "Product").await?,
            };
            order.product_id = product.id;
            if let Some(quantity) = input.quantity {
                order.quantity = quantity;
            }
            order.total_amount = total_amount(product.price, order.quantity);
        }
        if let Some(status) = status {
            order.status = status;
        }
        order.apply(&input);
        order.touch(Utc::now());

        let order = self
            .db
            .orders
            .replace(order)
            .await
            .map_err(gone(NOT_FOUND))?;
        self.view(order, Detail::Brief).await
    }

    pub async fn patch_status(
        &self,
        ctx: &RequestContext,
        id: &str,
        patch: StatusPatch,
    ) -> ApiResult<OrderView> {
        let grant = self
            .policy
            .authorize(ctx.principal(), Resource::Order, Action::Patch)?;
        let raw = clean(patch.status)
            .ok_or_else(|| ApiError::Validation("Status is required".to_string()))?;
        let status = parse_status(&raw)?;

        let id = path_id(id, NOT_FOUND)?;
        let mut order = self.load(&id).await?;
        grant.check_owner(&order.user_id).map_err(hide(NOT_FOUND))?;

        order.status = status;
        order.touch(Utc::now());
        info!("Order {} is now {}", order.id, order.status);

        let order = self
            .db
            .orders
            .replace(order)
            .await
            .map_err(gone(NOT_FOUND))?;
        self.view(order, Detail::Brief).await
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> ApiResult<Message> {
        self.policy
            .authorize(ctx.principal(), Resource::Order, Action::Delete)?;
        let id = path_id(id, NOT_FOUND)?;
        self.db
            .orders
            .remove(&id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        info!("Deleted order {}", id);
        Ok(Message::new("Order deleted successfully"))
    }

    async fn load(&self, id: &RecordId) -> ApiResult<Order> {
        self.db
            .orders
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))
    }

    async fn view(&self, order: Order, detail: Detail) -> ApiResult<OrderView> {
        let reference = product_reference(&self.db, order.product_id, detail).await?;
        Ok(Populated::new(order, "productId", reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::iam::{Principal, Role};
    use crate::core::models::Product;

    fn ctx(role: Role) -> RequestContext {
        RequestContext::authenticated(Principal::new(RecordId::new(), "someone", role))
    }

    async fn seed_product(db: &Database, price: f64) -> RecordId {
        let now = Utc::now();
        let id = RecordId::new();
        db.products
            .insert(Product {
                id,
                name: "Anvil".into(),
                sku: format!("SKU-{}", id),
                supplier_id: RecordId::new(),
                quantity: 0,
                price,
                description: Some("Heavy".into()),
                category: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        id
    }

    fn order_input(product: RecordId, quantity: i64) -> OrderInput {
        OrderInput {
            product_id: Some(product.to_string()),
            quantity: Some(quantity),
            customer_name: Some("Road Runner".into()),
            shipping_address: Some("2 Mesa Way".into()),
            status: Some("delivered".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_prices_and_starts_pending() {
        let db = Database::in_memory();
        let product = seed_product(&db, 25.0).await;
        let service = OrderService::new(db);

        let view = service
            .create(&ctx(Role::User), order_input(product, 3))
            .await
            .unwrap();
        assert_eq!(view.doc.total_amount, 75.0);
        assert_eq!(view.doc.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_update_reprices() {
        let db = Database::in_memory();
        let cheap = seed_product(&db, 25.0).await;
        let dear = seed_product(&db, 40.0).await;
        let service = OrderService::new(db);
        let owner = ctx(Role::User);
        let id = service
            .create(&owner, order_input(cheap, 3))
            .await
            .unwrap()
            .doc
            .id
            .to_string();

        let five = service
            .update(
                &owner,
                &id,
                OrderInput {
                    quantity: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(five.doc.total_amount, 125.0);

        let switched = service
            .update(
                &owner,
                &id,
                OrderInput {
                    product_id: Some(dear.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(switched.doc.total_amount, 200.0);

        let untouched = service
            .update(
                &owner,
                &id,
                OrderInput {
                    notes: Some("leave at door".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(untouched.doc.total_amount, 200.0);
    }

    #[tokio::test]
    async fn test_foreign_order_is_hidden() {
        let db = Database::in_memory();
        let product = seed_product(&db, 25.0).await;
        let service = OrderService::new(db);
        let alice = ctx(Role::User);
        let bob = ctx(Role::User);
        let id = service
            .create(&alice, order_input(product, 1))
            .await
            .unwrap()
            .doc
            .id
            .to_string();

        let err = service.get(&bob, &id).await.unwrap_err();
        assert_eq!(err.status(), 404);
        assert_eq!(err.public_message(), "Order not found");

        let err = service
            .patch_status(
                &bob,
                &id,
                StatusPatch {
                    status: Some("shipped".into()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status(), 404);

        assert!(service.list(&bob).await.unwrap().is_empty());
        assert_eq!(service.list(&ctx(Role::Admin)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_patch_status_validation() {
        let db = Database::in_memory();
        let product = seed_product(&db, 25.0).await;
        let service = OrderService::new(db);
        let owner = ctx(Role::User);
        let id = service
            .create(&owner, order_input(product, 1))
            .await
            .unwrap()
            .doc
            .id
            .to_string();

        let err = service
            .patch_status(&owner, &id, StatusPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "Status is required");

        let err = service
            .patch_status(
                &owner,
                &id,
                StatusPatch {
                    status: Some("lost".into()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "Invalid status");

        let view = service
            .patch_status(
                &owner,
                &id,
                StatusPatch {
                    status: Some("shipped".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(view.doc.status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_delete_is_admin_only() {
        let db = Database::in_memory();
        let product = seed_product(&db, 25.0).await;
        let service = OrderService::new(db.clone());
        let owner = ctx(Role::User);
        let id = service
            .create(&owner, order_input(product, 1))
            .await
            .unwrap()
            .doc
            .id
            .to_string();

        let err = service.delete(&owner, &id).await.unwrap_err();
        assert_eq!(err.status(), 403);
        assert_eq!(db.orders.count().await.unwrap(), 1);

        service.delete(&ctx(Role::Admin), &id).await.unwrap();
        let err = service.delete(&ctx(Role::Admin), &id).await.unwrap_err();
        assert_eq!(err.status(), 404);
    }
}
