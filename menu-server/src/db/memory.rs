//! In-memory document store
//!
//! Backs tests and `STORE_BACKEND=memory`. Deleting an absent document is a
//! no-op. [`MemoryStore::fail_writes_after`] injects store failures so
//! partial-failure paths can be exercised.

use super::document::{
    Document, DocumentStore, Fields, Filter, StoreError, StoreResult, merge_fields,
    new_document_id,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

/// collection path -> (document id -> body)
type Collections = HashMap<String, BTreeMap<String, Fields>>;

pub struct MemoryStore {
    collections: RwLock<Collections>,
    /// Remaining successful writes before every write fails (`usize::MAX` = unlimited)
    write_budget: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            write_budget: AtomicUsize::new(usize::MAX),
        }
    }

    /// Let the next `n` writes succeed, then fail all further writes with
    /// [`StoreError::Unavailable`]
    pub fn fail_writes_after(&self, n: usize) {
        self.write_budget.store(n, Ordering::SeqCst);
    }

    /// Remove any injected write failure
    pub fn heal(&self) {
        self.write_budget.store(usize::MAX, Ordering::SeqCst);
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    fn take_write_permit(&self) -> StoreResult<()> {
        let result = self
            .write_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                usize::MAX => Some(usize::MAX),
                0 => None,
                n => Some(n - 1),
            });
        match result {
            Ok(_) => Ok(()),
            Err(_) => Err(StoreError::Unavailable(
                "injected write failure".to_string(),
            )),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    async fn set(&self, collection: &str, id: &str, data: Fields, merge: bool) -> StoreResult<()> {
        self.take_write_permit()?;
        let mut collections = self.collections.write();
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.get_mut(id) {
            Some(existing) if merge => merge_fields(existing, data),
            _ => {
                docs.insert(id.to_string(), data);
            }
        }
        Ok(())
    }

    async fn add(&self, collection: &str, data: Fields) -> StoreResult<String> {
        self.take_write_permit()?;
        let id = new_document_id();
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: Fields) -> StoreResult<()> {
        self.take_write_permit()?;
        let mut collections = self.collections.write();
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;
        merge_fields(existing, patch);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.take_write_permit()?;
        if let Some(docs) = self.collections.write().get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read();
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(_, data)| filters.iter().all(|f| f.matches(data)))
            .map(|(id, data)| Document::new(id.clone(), data.clone()))
            .collect())
    }
}
