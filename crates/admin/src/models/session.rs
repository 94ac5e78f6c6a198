//! Session-stored state for admin authentication.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use innovacart_core::UserId;
use innovacart_firebase::AuthUser;

/// Session-stored admin identity.
///
/// Only accounts on the configured allowlist are ever stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Identity provider account id.
    pub uid: UserId,
    /// Lowercased email address.
    pub email: String,
    /// Display name.
    pub name: String,
}

impl From<&AuthUser> for CurrentAdmin {
    fn from(user: &AuthUser) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.trim().to_lowercase(),
            name: user.name().to_string(),
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub success: bool,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn class(&self) -> &'static str {
        if self.success {
            "flash flash-success"
        } else {
            "flash flash-error"
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the pending flash message.
    pub const FLASH: &str = "flash";
}

/// Queue a flash message for the next page.
pub async fn push_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(keys::FLASH, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the pending flash message, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session.remove::<Flash>(keys::FLASH).await.ok().flatten()
}
