//! Account overview for the signed-in customer.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use innovacart_core::order::total_spent;
use innovacart_core::{OrderStatus, format_taka};

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::page::PageContext;
use crate::routes::orders::OrderSummaryView;
use crate::state::AppState;

/// Orders shown on the overview before linking to the full history.
const RECENT_ORDERS: usize = 5;

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub page: PageContext,
    pub user: CurrentUser,
    pub order_count: usize,
    pub open_orders: usize,
    pub delivered: usize,
    pub total_spent: String,
    pub recent: Vec<OrderSummaryView>,
}

/// Display account details with order statistics.
#[instrument(skip(state, user, page), fields(user_id = %user.uid))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let orders = state.repos().orders.for_user(&user.uid).await?;
    let delivered = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .count();

    Ok(ProfileTemplate {
        order_count: orders.len(),
        open_orders: orders.len().saturating_sub(delivered),
        delivered,
        total_spent: format_taka(total_spent(&orders)),
        recent: orders
            .iter()
            .take(RECENT_ORDERS)
            .map(OrderSummaryView::from)
            .collect(),
        user,
        page,
    })
}
