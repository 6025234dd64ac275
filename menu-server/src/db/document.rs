//! Document store abstraction
//!
//! A schemaless JSON document database addressed by collection path and
//! document id, queried by equality filters. Collection paths are opaque, so
//! a subcollection is just a longer path (`restaurants/r1/menuItems`).
//!
//! Backends: [`MemoryStore`](super::MemoryStore) and
//! [`RedbStore`](super::RedbStore).

use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::models::field;
use shared::util::ServerClock;
use thiserror::Error;

/// Document body
pub type Fields = Map<String, Value>;

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Fields) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Field value, `Null` when absent
    pub fn field(&self, name: &str) -> &Value {
        self.data.get(name).unwrap_or(&Value::Null)
    }

    /// String field, `None` when absent or not a string
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }
}

/// Equality filter: `field == value`
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, data: &Fields) -> bool {
        data.get(&self.field) == Some(&self.value)
    }
}

/// Document/object store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Connectivity, permission or backend failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Request the store cannot accept (e.g. an object path escaping the root)
    #[error("Invalid store request: {0}")]
    Invalid(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Generic document store client
///
/// All calls may fail with [`StoreError::Unavailable`]. `update` fails with
/// [`StoreError::NotFound`] when the document does not exist; `delete` of an
/// absent document is backend-dependent.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Write a document under a caller-chosen id. With `merge`, top-level
    /// fields are merged into an existing document; otherwise it is replaced.
    async fn set(&self, collection: &str, id: &str, data: Fields, merge: bool) -> StoreResult<()>;

    /// Insert under a new store-assigned id
    async fn add(&self, collection: &str, data: Fields) -> StoreResult<String>;

    /// Merge `patch` into an existing document
    async fn update(&self, collection: &str, id: &str, patch: Fields) -> StoreResult<()>;

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// All documents of a collection matching every filter (no filters = all)
    async fn query(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Document>>;
}

/// Shallow merge of top-level fields
pub fn merge_fields(target: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

/// Fresh store-assigned document id
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Write a document with server timestamps.
///
/// `updatedAt` is refreshed on every call. `createdAt` is only stamped when
/// the incoming fields do not carry one and, for merge writes, the existing
/// document has none either (first write wins). Without an id the store
/// assigns one. Returns the document id.
pub async fn save_document(
    store: &dyn DocumentStore,
    clock: &ServerClock,
    collection: &str,
    id: Option<&str>,
    mut fields: Fields,
    merge: bool,
) -> StoreResult<String> {
    let now = clock.now();
    fields.insert(field::UPDATED_AT.into(), now.into());
    let has_created_at = fields
        .get(field::CREATED_AT)
        .is_some_and(|v| !v.is_null());

    match id {
        Some(id) => {
            if !has_created_at {
                let existing_created_at = if merge {
                    store
                        .get(collection, id)
                        .await?
                        .is_some_and(|doc| !doc.field(field::CREATED_AT).is_null())
                } else {
                    false
                };
                if !existing_created_at {
                    fields.insert(field::CREATED_AT.into(), now.into());
                }
            }
            tracing::debug!(collection, id, merge, "Saving document");
            store.set(collection, id, fields, merge).await?;
            Ok(id.to_string())
        }
        None => {
            if !has_created_at {
                fields.insert(field::CREATED_AT.into(), now.into());
            }
            let id = store.add(collection, fields).await?;
            tracing::debug!(collection, id = %id, "Added document");
            Ok(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn save_without_id_assigns_id_and_both_timestamps() {
        let store = MemoryStore::new();
        let clock = ServerClock::new();
        let id = save_document(&store, &clock, "things", None, fields(json!({ "a": 1 })), false)
            .await
            .unwrap();

        let doc = store.get("things", &id).await.unwrap().unwrap();
        assert!(doc.field("createdAt").is_i64());
        assert_eq!(doc.field("createdAt"), doc.field("updatedAt"));
    }

    #[tokio::test]
    async fn merge_save_keeps_first_created_at() {
        let store = MemoryStore::new();
        let clock = ServerClock::new();
        save_document(&store, &clock, "things", Some("t1"), fields(json!({ "a": 1 })), false)
            .await
            .unwrap();
        let first = store.get("things", "t1").await.unwrap().unwrap();

        save_document(&store, &clock, "things", Some("t1"), fields(json!({ "b": 2 })), true)
            .await
            .unwrap();
        let second = store.get("things", "t1").await.unwrap().unwrap();

        assert_eq!(second.field("createdAt"), first.field("createdAt"));
        assert!(second.field("updatedAt").as_i64() > first.field("updatedAt").as_i64());
        assert_eq!(second.field("a"), &json!(1));
        assert_eq!(second.field("b"), &json!(2));
    }

    #[tokio::test]
    async fn caller_supplied_created_at_is_kept() {
        let store = MemoryStore::new();
        let clock = ServerClock::new();
        let id = save_document(
            &store,
            &clock,
            "things",
            None,
            fields(json!({ "createdAt": 5 })),
            false,
        )
        .await
        .unwrap();
        let doc = store.get("things", &id).await.unwrap().unwrap();
        assert_eq!(doc.field("createdAt"), &json!(5));
    }

    #[test]
    fn filter_matches_exact_value_only() {
        let data = fields(json!({ "restaurantId": "r1" }));
        assert!(Filter::eq("restaurantId", "r1").matches(&data));
        assert!(!Filter::eq("restaurantId", "r2").matches(&data));
        assert!(!Filter::eq("missing", "r1").matches(&data));
    }
}
