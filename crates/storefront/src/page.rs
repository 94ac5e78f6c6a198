//! Data every full page needs for the shared layout.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::middleware::CspNonce;
use crate::models::session::{load_cart, take_flash};
use crate::models::{CurrentUser, Flash, session_keys};
use crate::state::AppState;

/// Layout context: navigation toggles, the signed-in customer, the cart
/// badge and any pending flash message.
///
/// Extracting it consumes the flash, so only extract it in handlers that
/// render a page.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub cart_count: u32,
    pub show_tshirts: bool,
    pub show_it_solutions: bool,
    pub nonce: String,
    pub flash: Option<Flash>,
}

impl PageContext {
    /// Display name of the signed-in customer.
    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.name.as_str())
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let settings = state.repos().settings.get().await;
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;

        let mut page = Self {
            show_tshirts: settings.tshirt_page_available,
            show_it_solutions: settings.it_solutions_available,
            nonce,
            ..Self::default()
        };

        if let Some(session) = parts.extensions.get::<Session>() {
            page.user = session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten();
            page.cart_count = load_cart(session).await.item_count();
            page.flash = take_flash(session).await;
        }

        Ok(page)
    }
}
