//! Image upload errors.

use thiserror::Error;

/// Errors that can occur when uploading to Cloudinary.
#[derive(Debug, Error)]
pub enum CloudinaryError {
    /// The upload had no bytes.
    #[error("Please choose an image to upload")]
    Empty,

    /// The file is over the size limit.
    #[error("Image is too large ({size} bytes, limit {limit} bytes)")]
    TooLarge { size: usize, limit: usize },

    /// The content type is not an accepted image format.
    #[error("Only JPEG, PNG, WebP, and GIF files are allowed (got {0})")]
    UnsupportedType(String),

    /// HTTP request failed.
    #[error("Cloudinary request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("Cloudinary response error: {0}")]
    Response(String),

    /// Cloudinary rejected the upload.
    #[error("Cloudinary API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl CloudinaryError {
    /// Whether the message describes a problem with the submitted file.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Empty | Self::TooLarge { .. } | Self::UnsupportedType(_)
        )
    }
}
