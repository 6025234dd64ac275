//! Database Module
//!
//! Document store abstraction, its backends, the object store and the
//! repositories built on top of them.

pub mod document;
pub mod memory;
pub mod object_store;
pub mod redb_store;
pub mod repository;

pub use document::{
    Document, DocumentStore, Fields, Filter, StoreError, StoreResult, save_document,
};
pub use memory::MemoryStore;
pub use object_store::{LocalObjectStore, MemoryObjectStore, ObjectStore, StoredObject};
pub use redb_store::{RedbStore, RedbStoreError};

/// Top-level restaurant collection
pub const RESTAURANTS: &str = "restaurants";

/// Top-level (flat) menu item collection
pub const MENU_ITEMS: &str = "menuItems";

/// Legacy nested menu item subcollection of one restaurant
pub fn nested_menu_items(restaurant_id: &str) -> String {
    format!("{RESTAURANTS}/{restaurant_id}/{MENU_ITEMS}")
}
