//! Services

pub mod image_upload;

pub use image_upload::{ImageUploadService, MAX_FILE_SIZE};
