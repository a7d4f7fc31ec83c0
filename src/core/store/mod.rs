//! Document store abstraction
//!
//! Services talk to typed [`Collection`]s; the engine behind them only has to
//! offer create/read/update/delete, filtered lookups and unique indexes.
//! Unique indexes are the source of truth for uniqueness: a service-level
//! pre-check only rejects early, and two racing writes are settled here.

mod memory;

pub use memory::MemoryCollection;

use crate::core::iam::Scope;
use crate::core::ids::RecordId;
use crate::core::models::{Inventory, Order, Product, Supplier, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Store operation result type
pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique index already holds this key
    #[error("Duplicate key on {index}: {message}")]
    DuplicateKey {
        index: &'static str,
        message: String,
    },

    /// Replace targeted a record that does not exist
    #[error("No {collection} record with id {id}")]
    Missing {
        collection: &'static str,
        id: RecordId,
    },

    /// The engine could not serve the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// An entry of a unique index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueKey {
    /// Index name, e.g. `products.sku`
    pub index: &'static str,
    /// Indexed value in canonical form
    pub value: String,
    /// Message reported on collision
    pub message: &'static str,
}

/// A record type that can live in a collection
pub trait Document: Clone + Send + Sync + 'static {
    /// Collection name
    const COLLECTION: &'static str;

    fn id(&self) -> RecordId;

    /// Owning principal, for owner-scoped collections
    fn owner(&self) -> Option<RecordId> {
        None
    }

    /// Entries this record occupies in unique indexes
    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }

    /// Listing order key; larger sorts first
    fn sort_key(&self) -> DateTime<Utc>;
}

type Predicate<D> = Box<dyn Fn(&D) -> bool + Send + Sync>;

/// Filter for [`Collection::find`]
///
/// The owner scope is part of the query itself so that a narrowed listing is
/// narrowed inside the engine, not after it.
pub struct Query<D> {
    scope: Scope,
    predicate: Option<Predicate<D>>,
}

impl<D: Document> Query<D> {
    /// Every record
    pub fn all() -> Self {
        Query {
            scope: Scope::All,
            predicate: None,
        }
    }

    /// Records inside an ownership scope
    pub fn scoped(scope: Scope) -> Self {
        Query {
            scope,
            predicate: None,
        }
    }

    /// Add a field predicate
    pub fn filter(mut self, predicate: impl Fn(&D) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Whether a record satisfies scope and predicate
    pub fn matches(&self, doc: &D) -> bool {
        let in_scope = match self.scope {
            Scope::All => true,
            Scope::Owner(_) => doc.owner().is_some_and(|owner| self.scope.admits(&owner)),
        };
        in_scope && self.predicate.as_ref().map_or(true, |p| p(doc))
    }
}

/// Typed access to one collection
#[async_trait]
pub trait Collection<D: Document>: Send + Sync {
    /// Insert a new record, enforcing unique indexes
    async fn insert(&self, doc: D) -> StoreResult<D>;

    /// Fetch a record by id
    async fn get(&self, id: &RecordId) -> StoreResult<Option<D>>;

    /// All matching records, ordered by descending sort key
    async fn find(&self, query: Query<D>) -> StoreResult<Vec<D>>;

    /// First matching record in listing order
    async fn find_one(&self, query: Query<D>) -> StoreResult<Option<D>> {
        Ok(self.find(query).await?.into_iter().next())
    }

    /// Overwrite an existing record, enforcing unique indexes
    async fn replace(&self, doc: D) -> StoreResult<D>;

    /// Remove a record, returning it if it existed
    async fn remove(&self, id: &RecordId) -> StoreResult<Option<D>>;

    /// Number of records
    async fn count(&self) -> StoreResult<usize>;
}

/// Handles to every collection the services use
#[derive(Clone)]
pub struct Database {
    pub users: Arc<dyn Collection<User>>,
    pub suppliers: Arc<dyn Collection<Supplier>>,
    pub products: Arc<dyn Collection<Product>>,
    pub inventory: Arc<dyn Collection<Inventory>>,
    pub orders: Arc<dyn Collection<Order>>,
}

impl Database {
    /// A database backed entirely by [`MemoryCollection`]s
    pub fn in_memory() -> Self {
        Database {
            users: Arc::new(MemoryCollection::<User>::new()),
            suppliers: Arc::new(MemoryCollection::<Supplier>::new()),
            products: Arc::new(MemoryCollection::<Product>::new()),
            inventory: Arc::new(MemoryCollection::<Inventory>::new()),
            orders: Arc::new(MemoryCollection::<Order>::new()),
        }
    }
}
