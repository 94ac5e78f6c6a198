//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use tokio::try_join;
use tower_sessions::Session;
use tracing::instrument;

use innovacart_core::order::{Order, OrderStats};
use innovacart_core::{OrderStatus, format_taka};

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::session::take_flash;
use crate::models::{CurrentAdmin, Flash};
use crate::state::AppState;

/// Orders listed under the statistics.
const RECENT_ORDERS: usize = 5;

/// Admin user view for the layout header.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.clone(),
        }
    }
}

/// One row of the recent orders table.
#[derive(Debug, Clone)]
pub struct RecentOrderView {
    pub id: String,
    pub reference: String,
    pub customer: String,
    pub total: String,
    pub status: String,
    pub status_class: String,
    pub date: String,
}

impl From<&Order> for RecentOrderView {
    fn from(order: &Order) -> Self {
        let customer = if order.customer_info.name.trim().is_empty() {
            order.user_name.clone()
        } else {
            order.customer_info.name.clone()
        };
        Self {
            id: order.id.to_string(),
            reference: order.short_id(),
            customer,
            total: format_taka(order.amount_due()),
            status: order.status.label().to_string(),
            status_class: order.status.badge_class().to_string(),
            date: order.created_at.format("%b %d, %Y").to_string(),
        }
    }
}

/// Order count for one status, linked to the filtered list.
#[derive(Debug, Clone)]
pub struct StatusCountView {
    pub label: &'static str,
    pub slug: &'static str,
    pub class: &'static str,
    pub count: usize,
}

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub total_products: usize,
    pub total_orders: usize,
    pub active_coupons: usize,
    pub revenue: String,
    pub status_counts: Vec<StatusCountView>,
    pub recent_orders: Vec<RecentOrderView>,
}

/// Dashboard page handler.
#[instrument(skip(admin, state, session))]
pub async fn dashboard(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>> {
    let repos = state.repos();
    let (orders, coupons, products) =
        try_join!(repos.orders.list(), repos.coupons.list(), repos.products.list())?;
    let stats = OrderStats::from_orders(&orders, &coupons, &products, chrono::Utc::now());

    let template = DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        flash: take_flash(&session).await,
        total_products: stats.total_products,
        total_orders: stats.total_orders,
        active_coupons: stats.active_coupons,
        revenue: format_taka(stats.revenue),
        status_counts: OrderStatus::ALL
            .iter()
            .map(|status| StatusCountView {
                label: status.label(),
                slug: status.as_str(),
                class: status.badge_class(),
                count: stats.count(*status),
            })
            .collect(),
        recent_orders: orders
            .iter()
            .take(RECENT_ORDERS)
            .map(RecentOrderView::from)
            .collect(),
    };

    Ok(Html(template.render()?))
}
