//! Binary object storage for uploaded images
//!
//! Objects are addressed by a relative, `/`-separated path and exposed under
//! a public base URL (`{base_url}/{path}`).

use super::document::{StoreError, StoreResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub url: String,
    pub path: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> StoreResult<StoredObject>;
}

fn public_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Reject absolute paths and parent-directory components
fn checked_relative(path: &str) -> StoreResult<PathBuf> {
    let relative = Path::new(path);
    let ok = !path.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !ok {
        return Err(StoreError::Invalid(format!("invalid object path: {path}")));
    }
    Ok(relative.to_path_buf())
}

/// Object store kept in memory (tests, `STORE_BACKEND=memory`)
pub struct MemoryObjectStore {
    base_url: String,
    objects: RwLock<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Stored bytes and content type
    pub fn object(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.objects.read().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> StoreResult<StoredObject> {
        checked_relative(path)?;
        self.objects
            .write()
            .insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(StoredObject {
            url: public_url(&self.base_url, path),
            path: path.to_string(),
        })
    }
}

/// Object store on the local filesystem, served back under `/files`
pub struct LocalObjectStore {
    root: PathBuf,
    base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> StoreResult<StoredObject> {
        let target = self.root.join(checked_relative(path)?);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Unavailable(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        tokio::fs::write(&target, &bytes).await.map_err(|e| {
            StoreError::Unavailable(format!("Failed to write {}: {e}", target.display()))
        })?;

        tracing::debug!(path, content_type, size = bytes.len(), "Object stored");
        Ok(StoredObject {
            url: public_url(&self.base_url, path),
            path: path.to_string(),
        })
    }
}
