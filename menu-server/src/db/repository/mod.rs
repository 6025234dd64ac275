//! Repository Module
//!
//! Typed CRUD over the document store. Records are decoded at this boundary;
//! a malformed document surfaces as [`RepoError::Validation`].

pub mod menu_item;
pub mod restaurant;

pub use menu_item::{Layout, MenuItemRepository};
pub use restaurant::RestaurantRepository;

use super::{DocumentStore, StoreError};
use shared::models::ValidationError;
use shared::util::ServerClock;
use std::sync::Arc;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<StoreError> for RepoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(path) => RepoError::NotFound(path),
            StoreError::Unavailable(msg) => RepoError::StoreUnavailable(msg),
            StoreError::Invalid(msg) => RepoError::Validation(msg),
            StoreError::Serialization(e) => RepoError::Validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(err: ValidationError) -> Self {
        RepoError::Validation(err.0)
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Base repository with store and clock handles
#[derive(Clone)]
pub struct BaseRepository {
    store: Arc<dyn DocumentStore>,
    clock: Arc<ServerClock>,
}

impl BaseRepository {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<ServerClock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn clock(&self) -> &ServerClock {
        &self.clock
    }
}
