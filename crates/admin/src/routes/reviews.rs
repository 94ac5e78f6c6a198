//! Review moderation.

#![allow(clippy::used_underscore_binding)]

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use tower_sessions::Session;
use tracing::instrument;

use innovacart_core::{ProductId, ReviewId};

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::models::session::push_flash;
use crate::state::AppState;

/// Delete a review and return to the product's edit page.
#[instrument(skip(_admin, state, session), fields(product_id = %product_id, review_id = %review_id))]
pub async fn delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path((product_id, review_id)): Path<(String, String)>,
) -> Result<Redirect> {
    let product_id = ProductId::new(product_id);
    state
        .repos()
        .reviews
        .delete(&product_id, &ReviewId::new(review_id))
        .await?;
    push_flash(&session, Flash::success("Review deleted")).await;
    Ok(Redirect::to(&format!("/products/{product_id}/edit")))
}
