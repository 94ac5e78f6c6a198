//! Upload limits, request and response types, and delivery URL helpers.

use serde::Deserialize;

use super::error::CloudinaryError;

/// Largest accepted upload (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Content types accepted for product and category images.
pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/gif",
];

/// An image received from the admin upload form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Check size and type before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns `Empty`, `TooLarge` or `UnsupportedType`.
    pub fn validate(&self) -> Result<(), CloudinaryError> {
        if self.bytes.is_empty() {
            return Err(CloudinaryError::Empty);
        }
        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(CloudinaryError::TooLarge {
                size: self.bytes.len(),
                limit: MAX_UPLOAD_BYTES,
            });
        }
        let content_type = self.content_type.trim().to_ascii_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(CloudinaryError::UnsupportedType(self.content_type.clone()));
        }
        Ok(())
    }
}

/// Fields of a successful upload response that the admin uses.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub secure_url: String,
    pub public_id: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub message: String,
}

const UPLOAD_SEGMENT: &str = "/image/upload/";

/// Delivery URL resized and cropped to `width` x `height` with automatic
/// quality and format.
///
/// URLs not served by Cloudinary are returned unchanged.
#[must_use]
pub fn optimized_url(url: &str, width: u32, height: u32) -> String {
    if !url.contains("res.cloudinary.com") {
        return url.to_string();
    }
    match url.split_once(UPLOAD_SEGMENT) {
        Some((base, rest)) => {
            format!("{base}{UPLOAD_SEGMENT}q_auto,f_auto,w_{width},h_{height},c_fill/{rest}")
        }
        None => url.to_string(),
    }
}
