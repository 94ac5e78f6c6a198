//! Session-stored state: the signed-in customer, the cart, the applied
//! coupon and one-shot flash messages.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use innovacart_core::UserId;
use innovacart_core::cart::Cart;
use innovacart_core::order::OrderUser;
use innovacart_firebase::AuthUser;

/// Session-stored customer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub uid: UserId,
    pub email: String,
    pub name: String,
}

impl From<&AuthUser> for CurrentUser {
    fn from(user: &AuthUser) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            name: user.name().to_string(),
        }
    }
}

impl From<&CurrentUser> for OrderUser {
    fn from(user: &CurrentUser) -> Self {
        Self {
            id: user.uid.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// CSS class for the banner.
    #[must_use]
    pub const fn class(&self) -> &'static str {
        match self.kind {
            FlashKind::Success => "flash flash-success",
            FlashKind::Error => "flash flash-error",
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the serialized cart.
    pub const CART: &str = "cart";

    /// Key for the coupon code applied at checkout.
    pub const COUPON_CODE: &str = "coupon_code";

    /// Key for the pending flash message.
    pub const FLASH: &str = "flash";
}

/// Cart stored in the session. A missing or unreadable cart is empty.
pub async fn load_cart(session: &Session) -> Cart {
    match session.get::<serde_json::Value>(keys::CART).await {
        Ok(Some(value)) => Cart::from_json_lossy(value),
        Ok(None) => Cart::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read cart from session");
            Cart::new()
        }
    }
}

/// Store the cart in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART, cart).await
}

/// Coupon code applied at checkout, if any.
pub async fn applied_coupon(session: &Session) -> Option<String> {
    session
        .get::<String>(keys::COUPON_CODE)
        .await
        .ok()
        .flatten()
        .filter(|code| !code.trim().is_empty())
}

/// Remember a coupon code for checkout.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_applied_coupon(
    session: &Session,
    code: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::COUPON_CODE, code).await
}

/// Forget the applied coupon.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_applied_coupon(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<String>(keys::COUPON_CODE).await?;
    Ok(())
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
