//! redb-backed document store
//!
//! # Tables
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `documents` | `(collection, id)` | JSON-serialized document body |
//!
//! A collection is the key range starting at `(collection, "")`. Nested
//! subcollection paths are separate collections because the full path is the
//! first key component.

use super::document::{
    Document, DocumentStore, Fields, Filter, StoreError, StoreResult, merge_fields,
    new_document_id,
};
use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// key = (collection path, document id), value = JSON bytes
const DOCUMENTS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("documents");

#[derive(Debug, Error)]
pub enum RedbStoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document not found: {0}")]
    NotFound(String),
}

pub type RedbStoreResult<T> = Result<T, RedbStoreError>;

impl From<RedbStoreError> for StoreError {
    fn from(err: RedbStoreError) -> Self {
        match err {
            RedbStoreError::Serialization(e) => StoreError::Serialization(e),
            RedbStoreError::NotFound(path) => StoreError::NotFound(path),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Document store backed by a single redb file
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> RedbStoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> RedbStoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> RedbStoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DOCUMENTS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    fn read_doc(&self, collection: &str, id: &str) -> RedbStoreResult<Option<Fields>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;
        match table.get((collection, id))? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    fn write_doc(
        &self,
        collection: &str,
        id: &str,
        data: Fields,
        merge: bool,
        must_exist: bool,
    ) -> RedbStoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DOCUMENTS_TABLE)?;
            let existing: Option<Fields> = match table.get((collection, id))? {
                Some(guard) => Some(serde_json::from_slice(guard.value())?),
                None => None,
            };

            let body = match existing {
                Some(mut current) if merge => {
                    merge_fields(&mut current, data);
                    current
                }
                None if must_exist => {
                    return Err(RedbStoreError::NotFound(format!("{collection}/{id}")));
                }
                _ => data,
            };
            let bytes = serde_json::to_vec(&body)?;
            table.insert((collection, id), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove_doc(&self, collection: &str, id: &str) -> RedbStoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DOCUMENTS_TABLE)?;
            table.remove((collection, id))?;
        }
        txn.commit()?;
        Ok(())
    }

    fn scan(&self, collection: &str, filters: &[Filter]) -> RedbStoreResult<Vec<Document>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;

        let mut docs = Vec::new();
        for result in table.range((collection, "")..)? {
            let (key, value) = result?;
            let (key_collection, id) = key.value();
            if key_collection != collection {
                break;
            }
            let data: Fields = serde_json::from_slice(value.value())?;
            if filters.iter().all(|f| f.matches(&data)) {
                docs.push(Document::new(id, data));
            }
        }
        Ok(docs)
    }
}

#[async_trait]
impl DocumentStore for RedbStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        Ok(self
            .read_doc(collection, id)?
            .map(|data| Document::new(id, data)))
    }

    async fn set(&self, collection: &str, id: &str, data: Fields, merge: bool) -> StoreResult<()> {
        Ok(self.write_doc(collection, id, data, merge, false)?)
    }

    async fn add(&self, collection: &str, data: Fields) -> StoreResult<String> {
        let id = new_document_id();
        self.write_doc(collection, &id, data, false, false)?;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: Fields) -> StoreResult<()> {
        Ok(self.write_doc(collection, id, patch, true, true)?)
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        Ok(self.remove_doc(collection, id)?)
    }

    async fn query(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Document>> {
        Ok(self.scan(collection, filters)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_set_get_and_merge() {
        let store = RedbStore::open_in_memory().unwrap();
        store.set("c", "d", fields(json!({ "a": 1 })), false).await.unwrap();
        store.set("c", "d", fields(json!({ "b": 2 })), true).await.unwrap();

        let doc = store.get("c", "d").await.unwrap().unwrap();
        assert_eq!(doc.data, fields(json!({ "a": 1, "b": 2 })));
        assert!(store.get("c", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = RedbStore::open_in_memory().unwrap();
        let err = store.update("c", "d", Fields::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_query_stays_inside_collection() {
        let store = RedbStore::open_in_memory().unwrap();
        store.set("menuItems", "a", fields(json!({ "r": "1" })), false).await.unwrap();
        store.set("menuItems", "b", fields(json!({ "r": "2" })), false).await.unwrap();
        // Sorts right after "menuItems" in key order
        store.set("menuItemsArchive", "c", fields(json!({ "r": "1" })), false).await.unwrap();
        store.set("restaurants/1/menuItems", "d", fields(json!({})), false).await.unwrap();

        let all = store.query("menuItems", &[]).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = store.query("menuItems", &[Filter::eq("r", "1")]).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "a");

        let nested = store.query("restaurants/1/menuItems", &[]).await.unwrap();
        assert_eq!(nested.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_add() {
        let store = RedbStore::open_in_memory().unwrap();
        let id = store.add("c", fields(json!({ "x": true }))).await.unwrap();
        assert!(store.get("c", &id).await.unwrap().is_some());
        store.delete("c", &id).await.unwrap();
        assert!(store.get("c", &id).await.unwrap().is_none());
        // Absent delete is a no-op
        store.delete("c", &id).await.unwrap();
    }

    #[tokio::test]
    async fn test_reopen_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.set("restaurants", "r1", fields(json!({ "name": "Spice Hub" })), false)
                .await
                .unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        let doc = store.get("restaurants", "r1").await.unwrap().unwrap();
        assert_eq!(doc.str_field("name"), Some("Spice Hub"));
    }
}
