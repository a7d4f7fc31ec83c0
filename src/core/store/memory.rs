//! In-memory collection engine
//!
//! Records live in a `HashMap` behind a `parking_lot::RwLock`. Unique index
//! entries are checked and written under the same write guard as the record,
//! so uniqueness holds even when two requests race past their pre-checks.
//! No guard is ever held across an `.await`.

use super::{Collection, Document, Query, StoreError, StoreResult, UniqueKey};
use crate::core::ids::RecordId;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

struct Inner<D> {
    docs: HashMap<RecordId, D>,
    unique: HashMap<(&'static str, String), RecordId>,
}

impl<D: Document> Inner<D> {
    /// First key in `keys` held by a record other than `owner`
    fn collision<'k>(&self, keys: &'k [UniqueKey], owner: &RecordId) -> Option<&'k UniqueKey> {
        keys.iter().find(|key| {
            self.unique
                .get(&(key.index, key.value.clone()))
                .is_some_and(|holder| holder != owner)
        })
    }

    fn index(&mut self, keys: Vec<UniqueKey>, id: RecordId) {
        for key in keys {
            self.unique.insert((key.index, key.value), id);
        }
    }

    fn unindex(&mut self, doc: &D) {
        for key in doc.unique_keys() {
            self.unique.remove(&(key.index, key.value));
        }
    }
}

/// Collection held in process memory
pub struct MemoryCollection<D> {
    inner: Arc<RwLock<Inner<D>>>,
    fault: Arc<RwLock<Option<String>>>,
}

impl<D: Document> MemoryCollection<D> {
    pub fn new() -> Self {
        MemoryCollection {
            inner: Arc::new(RwLock::new(Inner {
                docs: HashMap::new(),
                unique: HashMap::new(),
            })),
            fault: Arc::new(RwLock::new(None)),
        }
    }

    /// Make every following operation fail with `Unavailable`, or clear the fault
    pub fn set_fault(&self, fault: Option<&str>) {
        *self.fault.write() = fault.map(str::to_string);
    }

    fn check_fault(&self) -> StoreResult<()> {
        match self.fault.read().as_ref() {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

impl<D: Document> Default for MemoryCollection<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Clone for MemoryCollection<D> {
    fn clone(&self) -> Self {
        MemoryCollection {
            inner: Arc::clone(&self.inner),
            fault: Arc::clone(&self.fault),
        }
    }
}

fn duplicate(key: &UniqueKey) -> StoreError {
    StoreError::DuplicateKey {
        index: key.index,
        message: key.message.to_string(),
    }
}

#[async_trait]
impl<D: Document> Collection<D> for MemoryCollection<D> {
    async fn insert(&self, doc: D) -> StoreResult<D> {
        self.check_fault()?;
        let id = doc.id();
        let keys = doc.unique_keys();

        let mut inner = self.inner.write();
        if let Some(key) = inner.collision(&keys, &id) {
            debug!("Rejected insert into {}: {} taken", D::COLLECTION, key.index);
            return Err(duplicate(key));
        }
        inner.index(keys, id);
        inner.docs.insert(id, doc.clone());
        debug!("Inserted {} {}", D::COLLECTION, id);
        Ok(doc)
    }

    async fn get(&self, id: &RecordId) -> StoreResult<Option<D>> {
        self.check_fault()?;
        Ok(self.inner.read().docs.get(id).cloned())
    }

    async fn find(&self, query: Query<D>) -> StoreResult<Vec<D>> {
        self.check_fault()?;
        let mut found: Vec<D> = {
            let inner = self.inner.read();
            inner
                .docs
                .values()
                .filter(|doc| query.matches(doc))
                .cloned()
                .collect()
        };
        found.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        Ok(found)
    }

    async fn replace(&self, doc: D) -> StoreResult<D> {
        self.check_fault()?;
        let id = doc.id();
        let keys = doc.unique_keys();

        let mut inner = self.inner.write();
        let previous = match inner.docs.get(&id) {
            Some(previous) => previous.clone(),
            None => {
                return Err(StoreError::Missing {
                    collection: D::COLLECTION,
                    id,
                })
            }
        };
        if let Some(key) = inner.collision(&keys, &id) {
            debug!("Rejected update of {} {}: {} taken", D::COLLECTION, id, key.index);
            return Err(duplicate(key));
        }
        inner.unindex(&previous);
        inner.index(keys, id);
        inner.docs.insert(id, doc.clone());
        Ok(doc)
    }

    async fn remove(&self, id: &RecordId) -> StoreResult<Option<D>> {
        self.check_fault()?;
        let mut inner = self.inner.write();
        let removed = inner.docs.remove(id);
        if let Some(doc) = &removed {
            inner.unindex(doc);
            debug!("Removed {} {}", D::COLLECTION, id);
        }
        Ok(removed)
    }

    async fn count(&self) -> StoreResult<usize> {
        self.check_fault()?;
        Ok(self.inner.read().docs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::iam::Scope;
    use chrono::{DateTime, Duration, Utc};

    #[derive(Debug, Clone, PartialEq)]
    struct Widget {
        id: RecordId,
        owner: RecordId,
        code: String,
        at: DateTime<Utc>,
    }

    impl Document for Widget {
        const COLLECTION: &'static str = "widgets";

        fn id(&self) -> RecordId {
            self.id
        }

        fn owner(&self) -> Option<RecordId> {
            Some(self.owner)
        }

        fn unique_keys(&self) -> Vec<UniqueKey> {
            vec![UniqueKey {
                index: "widgets.code",
                value: self.code.clone(),
                message: "code taken",
            }]
        }

        fn sort_key(&self) -> DateTime<Utc> {
            self.at
        }
    }

    fn widget(owner: RecordId, code: &str, minutes_ago: i64) -> Widget {
        Widget {
            id: RecordId::new(),
            owner,
            code: code.to_string(),
            at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let coll: MemoryCollection<Widget> = MemoryCollection::new();
        let w = widget(RecordId::new(), "a", 0);
        coll.insert(w.clone()).await.unwrap();

        assert_eq!(coll.get(&w.id).await.unwrap(), Some(w));
        assert_eq!(coll.get(&RecordId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicate() {
        let coll: MemoryCollection<Widget> = MemoryCollection::new();
        coll.insert(widget(RecordId::new(), "a", 0)).await.unwrap();

        let err = coll.insert(widget(RecordId::new(), "a", 0)).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateKey {
                index: "widgets.code",
                message: "code taken".to_string()
            }
        );
        assert_eq!(coll.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_excludes_self_from_collision() {
        let coll: MemoryCollection<Widget> = MemoryCollection::new();
        let mut w = widget(RecordId::new(), "a", 0);
        coll.insert(w.clone()).await.unwrap();

        // Same key, same record
        coll.replace(w.clone()).await.unwrap();

        // Key moves: old value becomes free
        w.code = "b".to_string();
        coll.replace(w).await.unwrap();
        coll.insert(widget(RecordId::new(), "a", 0)).await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_into_taken_key_fails() {
        let coll: MemoryCollection<Widget> = MemoryCollection::new();
        coll.insert(widget(RecordId::new(), "a", 0)).await.unwrap();
        let mut w = widget(RecordId::new(), "b", 0);
        coll.insert(w.clone()).await.unwrap();

        w.code = "a".to_string();
        assert!(matches!(
            coll.replace(w).await,
            Err(StoreError::DuplicateKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_replace_missing() {
        let coll: MemoryCollection<Widget> = MemoryCollection::new();
        assert!(matches!(
            coll.replace(widget(RecordId::new(), "a", 0)).await,
            Err(StoreError::Missing { .. })
        ));
    }

    #[tokio::test]
    async fn test_remove_frees_unique_key() {
        let coll: MemoryCollection<Widget> = MemoryCollection::new();
        let w = widget(RecordId::new(), "a", 0);
        coll.insert(w.clone()).await.unwrap();

        assert!(coll.remove(&w.id).await.unwrap().is_some());
        assert!(coll.remove(&w.id).await.unwrap().is_none());
        coll.insert(widget(RecordId::new(), "a", 0)).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_scoped_and_ordered() {
        let coll: MemoryCollection<Widget> = MemoryCollection::new();
        let alice = RecordId::new();
        let bob = RecordId::new();
        coll.insert(widget(alice, "old", 10)).await.unwrap();
        coll.insert(widget(alice, "new", 1)).await.unwrap();
        coll.insert(widget(bob, "bobs", 5)).await.unwrap();

        let mine = coll.find(Query::scoped(Scope::Owner(alice))).await.unwrap();
        let codes: Vec<_> = mine.iter().map(|w| w.code.as_str()).collect();
        assert_eq!(codes, vec!["new", "old"]);

        let all = coll.find(Query::all()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].code, "new");

        let filtered = coll
            .find(Query::all().filter(|w: &Widget| w.code.starts_with('b')))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let coll: MemoryCollection<Widget> = MemoryCollection::new();
        coll.set_fault(Some("disk on fire"));
        assert_eq!(
            coll.count().await,
            Err(StoreError::Unavailable("disk on fire".to_string()))
        );
        coll.set_fault(None);
        assert_eq!(coll.count().await, Ok(0));
    }

    #[tokio::test]
    async fn test_concurrent_inserts_respect_unique_index() {
        let coll: MemoryCollection<Widget> = MemoryCollection::new();
        let mut handles = Vec::new();
        for _ in 0..16 {
            let coll = coll.clone();
            handles.push(tokio::spawn(async move {
                coll.insert(widget(RecordId::new(), "same", 0)).await.is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(coll.count().await.unwrap(), 1);
    }
}
