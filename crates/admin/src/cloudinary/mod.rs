//! Cloudinary image hosting for product and category images.
//!
//! - [`CloudinaryClient`] uploads images and returns their delivery URL
//! - [`ImageUpload::validate`] enforces the size and type limits
//! - [`optimized_url`] builds resized delivery URLs for thumbnails

mod client;
mod error;
mod types;

pub use client::CloudinaryClient;
pub use error::CloudinaryError;
pub use types::{
    ALLOWED_CONTENT_TYPES, ImageUpload, MAX_UPLOAD_BYTES, UploadResponse, optimized_url,
};
