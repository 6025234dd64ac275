//! Image Upload Service
//!
//! Stores restaurant and menu images in the object store under
//! `restaurants/{restaurantId}/{millis}-{fileName}` and hands back an
//! [`ImageRef::Stored`] for the caller to save on a document.

use crate::db::ObjectStore;
use crate::db::repository::{RepoError, RepoResult};
use shared::models::ImageRef;
use shared::util::ServerClock;
use std::sync::Arc;

/// Maximum file size (5MB)
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Fallback when nothing usable is left of the client file name
const DEFAULT_FILE_NAME: &str = "image";

#[derive(Clone)]
pub struct ImageUploadService {
    objects: Arc<dyn ObjectStore>,
    clock: Arc<ServerClock>,
}

impl ImageUploadService {
    pub fn new(objects: Arc<dyn ObjectStore>, clock: Arc<ServerClock>) -> Self {
        Self { objects, clock }
    }

    pub async fn upload(
        &self,
        restaurant_id: &str,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> RepoResult<ImageRef> {
        validate(restaurant_id, content_type, &bytes)?;

        let path = format!(
            "restaurants/{}/{}-{}",
            restaurant_id,
            self.clock.now(),
            sanitize_file_name(file_name)
        );
        let size = bytes.len();
        let stored = self.objects.put(&path, bytes, content_type).await?;
        tracing::info!(restaurant_id = %restaurant_id, path = %stored.path, size, "Image uploaded");

        Ok(ImageRef::Stored {
            url: stored.url,
            path: stored.path,
        })
    }
}

fn validate(restaurant_id: &str, content_type: &str, bytes: &[u8]) -> RepoResult<()> {
    if restaurant_id.trim().is_empty() || restaurant_id.contains('/') {
        return Err(RepoError::Validation("restaurant id is required for upload".into()));
    }
    if bytes.is_empty() {
        return Err(RepoError::Validation("Empty file provided".into()));
    }
    if bytes.len() > MAX_FILE_SIZE {
        return Err(RepoError::Validation(format!(
            "File too large. Maximum size is {} bytes ({}MB)",
            MAX_FILE_SIZE,
            MAX_FILE_SIZE / 1024 / 1024
        )));
    }
    if !content_type.to_ascii_lowercase().starts_with("image/") {
        return Err(RepoError::Validation(format!(
            "Unsupported content type '{content_type}', expected image/*"
        )));
    }
    Ok(())
}

/// Last path segment with anything outside `[A-Za-z0-9._-]` replaced by `_`
fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}
