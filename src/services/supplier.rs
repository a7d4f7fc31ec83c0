//! Supplier service; every operation is admin-only

use crate::core::iam::{Action, PolicyEngine, Resource};
use crate::core::ids::RecordId;
use crate::core::models::{clean, clean_email, Supplier, SupplierInput};
use crate::core::store::{Database, Query};
use crate::core::validation::{self, MissingFields};
use crate::error::{ApiError, ApiResult};
use crate::services::{gone, path_id, Message, RequestContext};
use chrono::Utc;
use tracing::info;

const NOT_FOUND: &str = "Supplier";

#[derive(Clone)]
pub struct SupplierService {
    db: Database,
    policy: PolicyEngine,
}

impl SupplierService {
    pub fn new(db: Database) -> Self {
        SupplierService {
            db,
            policy: PolicyEngine::new(),
        }
    }

    pub async fn list(&self, ctx: &RequestContext) -> ApiResult<Vec<Supplier>> {
        self.policy
            .authorize(ctx.principal(), Resource::Supplier, Action::List)?;
        Ok(self.db.suppliers.find(Query::all()).await?)
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> ApiResult<Supplier> {
        self.policy
            .authorize(ctx.principal(), Resource::Supplier, Action::Read)?;
        let id = path_id(id, NOT_FOUND)?;
        self.load(&id).await
    }

    pub async fn create(&self, ctx: &RequestContext, input: SupplierInput) -> ApiResult<Supplier> {
        self.policy
            .authorize(ctx.principal(), Resource::Supplier, Action::Create)?;
        validation::check(&input)?;

        let mut missing = MissingFields::new();
        let name = missing.take("name", clean(input.name));
        let contact = missing.take("contact", clean(input.contact));
        let address = missing.take("address", clean(input.address));
        missing.finish()?;

        let now = Utc::now();
        let supplier = self
            .db
            .suppliers
            .insert(Supplier {
                id: RecordId::new(),
                name: name.unwrap_or_default(),
                contact: contact.unwrap_or_default(),
                address: address.unwrap_or_default(),
                email: clean_email(input.email),
                phone: clean(input.phone),
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!("Created supplier {}", supplier.id);
        Ok(supplier)
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: SupplierInput,
    ) -> ApiResult<Supplier> {
        self.policy
            .authorize(ctx.principal(), Resource::Supplier, Action::Update)?;
        let id = path_id(id, NOT_FOUND)?;
        validation::check(&input)?;

        let mut supplier = self.load(&id).await?;
        supplier.apply(input);
        supplier.touch(Utc::now());
        self.db
            .suppliers
            .replace(supplier)
            .await
            .map_err(gone(NOT_FOUND))
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> ApiResult<Message> {
        self.policy
            .authorize(ctx.principal(), Resource::Supplier, Action::Delete)?;
        let id = path_id(id, NOT_FOUND)?;
        self.db
            .suppliers
            .remove(&id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        info!("Deleted supplier {}", id);
        Ok(Message::new("Supplier deleted successfully"))
    }

    async fn load(&self, id: &RecordId) -> ApiResult<Supplier> {
        self.db
            .suppliers
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))
    }
}
