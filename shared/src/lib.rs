//! Shared types for the menu data layer
//!
//! Plain data models exchanged between the store layer and its callers:
//! restaurants, menu items, image references, the response envelope and a
//! few time utilities.

pub mod models;
pub mod response;
pub mod util;

// Re-exports
pub use response::AppResponse;
pub use serde::{Deserialize, Serialize};
