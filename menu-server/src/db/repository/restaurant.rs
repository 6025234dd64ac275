//! Restaurant Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::{Document, DocumentStore, Fields, RESTAURANTS, save_document};
use shared::models::{Restaurant, RestaurantProfile, StoredRestaurant, field};
use shared::util::ServerClock;
use std::sync::Arc;

#[derive(Clone)]
pub struct RestaurantRepository {
    base: BaseRepository,
}

impl RestaurantRepository {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<ServerClock>) -> Self {
        Self {
            base: BaseRepository::new(store, clock),
        }
    }

    /// Create the restaurant for a newly signed-up owner.
    ///
    /// First write wins: an existing document is returned unchanged.
    pub async fn create_if_absent(&self, id: &str, data: RestaurantProfile) -> RepoResult<Restaurant> {
        if id.trim().is_empty() {
            return Err(RepoError::Validation("restaurant id cannot be empty".into()));
        }
        if let Some(existing) = self.find_by_id(id).await? {
            tracing::debug!(restaurant_id = %id, "Restaurant already exists, keeping first write");
            return Ok(existing);
        }

        let mut fields = data.into_fields()?;
        if !fields.get(field::NAME).is_some_and(|v| v.is_string()) {
            return Err(RepoError::Validation("restaurant name is required".into()));
        }
        fields.insert(field::IS_VERIFIED.into(), false.into());
        fields.insert(field::IS_PROFILE_COMPLETE.into(), false.into());

        save_document(self.base.store(), self.base.clock(), RESTAURANTS, Some(id), fields, false)
            .await?;
        tracing::info!(restaurant_id = %id, "Restaurant created");
        self.require(id).await
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Restaurant>> {
        match self.base.store().get(RESTAURANTS, id).await? {
            Some(doc) => Ok(Some(decode(&doc)?)),
            None => Ok(None),
        }
    }

    /// All restaurants ordered by id, at most `limit` when given
    pub async fn find_all(&self, limit: Option<usize>) -> RepoResult<Vec<Restaurant>> {
        let mut docs = self.base.store().query(RESTAURANTS, &[]).await?;
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        docs.into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|doc| decode(&doc))
            .collect()
    }

    /// Merge profile edits; flags and `createdAt` are never touched
    pub async fn update_profile(&self, id: &str, data: RestaurantProfile) -> RepoResult<Restaurant> {
        let fields = data.into_fields()?;
        self.merge(id, fields).await
    }

    /// Profile setup: apply the profile and mark it complete
    pub async fn complete_profile(&self, id: &str, data: RestaurantProfile) -> RepoResult<Restaurant> {
        let mut fields = data.into_fields()?;
        fields.insert(field::IS_PROFILE_COMPLETE.into(), true.into());
        let restaurant = self.merge(id, fields).await?;
        tracing::info!(restaurant_id = %id, "Restaurant profile completed");
        Ok(restaurant)
    }

    /// Verification by an administrator
    pub async fn mark_verified(&self, id: &str) -> RepoResult<Restaurant> {
        let mut fields = Fields::new();
        fields.insert(field::IS_VERIFIED.into(), true.into());
        let restaurant = self.merge(id, fields).await?;
        tracing::info!(restaurant_id = %id, "Restaurant verified");
        Ok(restaurant)
    }

    async fn merge(&self, id: &str, fields: Fields) -> RepoResult<Restaurant> {
        // 不存在则报错，不隐式创建
        self.require(id).await?;
        save_document(self.base.store(), self.base.clock(), RESTAURANTS, Some(id), fields, true)
            .await?;
        self.require(id).await
    }

    async fn require(&self, id: &str) -> RepoResult<Restaurant> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Restaurant {} not found", id)))
    }
}

fn decode(doc: &Document) -> RepoResult<Restaurant> {
    Ok(StoredRestaurant::from_fields(&doc.data)?.into_restaurant(&doc.id))
}
