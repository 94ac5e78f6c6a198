//! Error types for the database client and the repositories built on it.

use thiserror::Error;

use innovacart_core::catalog::ProductError;
use innovacart_core::coupon::CouponError;
use innovacart_core::review::ReviewError;

/// Errors from the Realtime Database transport.
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Database returned a non-success status.
    #[error("database returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Security rules rejected the request.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Response or stored value could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Path contains characters the database forbids in keys.
    #[error("invalid database path: {0}")]
    InvalidPath(String),

    /// Configured database URL could not be parsed.
    #[error("invalid database URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] FirebaseError),

    /// Requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Record conflicts with an existing one (e.g. duplicate coupon code).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Product failed validation.
    #[error(transparent)]
    Product(#[from] ProductError),

    /// Coupon could not be applied.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// Review failed validation.
    #[error(transparent)]
    Review(#[from] ReviewError),
}

impl RepositoryError {
    /// Whether the message is safe and useful to show to the person who
    /// submitted the request.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Conflict(_)
                | Self::Product(_)
                | Self::Coupon(_)
                | Self::Review(_)
        )
    }
}

/// Keep error bodies short in logs and messages.
pub(crate) fn excerpt(body: &str) -> String {
    body.chars().take(200).collect()
}
