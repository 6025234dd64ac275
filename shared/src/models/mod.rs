//! Data models
//!
//! Typed records decoded from the schemaless document store. Stored shapes
//! (`Stored*`) accept every historical write format; the public records
//! (`Restaurant`, `MenuItem`) are what callers see after coercion and image
//! normalization.

pub mod image_ref;
pub mod menu_item;
pub mod restaurant;
pub mod serde_helpers;

// Re-exports
pub use image_ref::*;
pub use menu_item::*;
pub use restaurant::*;
pub use serde_helpers::FormNumber;

/// Document field names shared by every collection
pub mod field {
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const NAME: &str = "name";
    pub const CATEGORY: &str = "category";
    pub const IMAGE: &str = "image";
    /// Deprecated alias of `image` on restaurant documents
    pub const RESTAURANT_IMAGE: &str = "restaurantImage";
    pub const RESTAURANT_ID: &str = "restaurantId";
    pub const RESTAURANT_NAME: &str = "restaurantName";
    pub const IS_AVAILABLE: &str = "isAvailable";
    pub const IS_VERIFIED: &str = "isVerified";
    pub const IS_PROFILE_COMPLETE: &str = "isProfileComplete";
}

/// Malformed input or a stored document that cannot be decoded
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
