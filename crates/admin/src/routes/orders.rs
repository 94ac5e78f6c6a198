//! Order management route handlers.

#![allow(clippy::used_underscore_binding)]

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use innovacart_core::invoice::{COMPANY_NAME, COMPANY_TAGLINE, Invoice};
use innovacart_core::order::{Order, filter_by_status};
use innovacart_core::{OrderId, OrderStatus, format_taka};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::models::session::{push_flash, take_flash};
use crate::state::AppState;

use super::dashboard::AdminUserView;

/// Query parameters for the order list.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
}

/// Order row in the list table.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub reference: String,
    pub customer: String,
    pub email: String,
    pub district: String,
    pub items: u32,
    pub total: String,
    pub payment_method: String,
    pub status: String,
    pub status_class: String,
    pub date: String,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            reference: order.short_id(),
            customer: order.customer_info.name.clone(),
            email: order.customer_info.email.clone(),
            district: order.customer_info.district.clone(),
            items: order.item_count(),
            total: format_taka(order.amount_due()),
            payment_method: order.payment_info.method.as_str().to_string(),
            status: order.status.label().to_string(),
            status_class: order.status.badge_class().to_string(),
            date: order.created_at.format("%b %d, %Y %H:%M").to_string(),
        }
    }
}

/// Status filter tab.
#[derive(Debug, Clone)]
pub struct StatusTab {
    pub label: &'static str,
    /// Query value; empty for "All".
    pub value: &'static str,
    pub count: usize,
    pub active: bool,
}

/// `<option>` for the status selector on the detail page.
#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Orders list page template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub tabs: Vec<StatusTab>,
    pub orders: Vec<OrderRow>,
}

/// Order detail page template.
#[derive(Template)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub id: String,
    pub invoice: Invoice,
    pub user_email: String,
    pub statuses: Vec<StatusOption>,
    pub tracking_id: String,
    pub updated_at: Option<String>,
}

/// Printable invoice, rendered without the admin layout.
#[derive(Template)]
#[template(path = "orders/invoice.html")]
pub struct InvoiceTemplate {
    pub company_name: &'static str,
    pub company_tagline: &'static str,
    pub invoice: Invoice,
}

/// Parse the `status` query value. Blank and unknown values show all orders.
fn parse_status_filter(value: Option<&str>) -> Option<OrderStatus> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

fn status_tabs(orders: &[Order], active: Option<OrderStatus>) -> Vec<StatusTab> {
    let mut tabs = vec![StatusTab {
        label: "All",
        value: "",
        count: orders.len(),
        active: active.is_none(),
    }];
    tabs.extend(OrderStatus::ALL.iter().map(|status| StatusTab {
        label: status.label(),
        value: status.as_str(),
        count: orders.iter().filter(|o| o.status == *status).count(),
        active: active == Some(*status),
    }));
    tabs
}

/// Orders list page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<OrdersQuery>,
) -> Result<Html<String>> {
    let orders = state.repos().orders.list().await?;
    let active = parse_status_filter(query.status.as_deref());
    let tabs = status_tabs(&orders, active);
    let orders = filter_by_status(orders, active);

    let template = OrdersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        flash: take_flash(&session).await,
        tabs,
        orders: orders.iter().map(OrderRow::from).collect(),
    };
    Ok(Html(template.render()?))
}

/// Order detail page handler.
#[instrument(skip(admin, state, session), fields(order_id = %id))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Html<String>> {
    let order = state.repos().orders.require(&OrderId::new(id)).await?;

    let template = OrderShowTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        flash: take_flash(&session).await,
        id: order.id.to_string(),
        invoice: Invoice::from(&order),
        user_email: order.user_email.clone(),
        statuses: OrderStatus::ALL
            .iter()
            .map(|status| StatusOption {
                value: status.as_str(),
                label: status.label(),
                selected: *status == order.status,
            })
            .collect(),
        tracking_id: order.tracking_id.clone().unwrap_or_default(),
        updated_at: order
            .updated_at
            .map(|at| at.format("%b %d, %Y %H:%M").to_string()),
    };
    Ok(Html(template.render()?))
}

/// Status change form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Update an order's status.
#[instrument(skip(_admin, state, session, form), fields(order_id = %id))]
pub async fn update_status(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let status: OrderStatus = form
        .status
        .parse()
        .map_err(|e: innovacart_core::ParseEnumError| AppError::BadRequest(e.to_string()))?;
    let id = OrderId::new(id);
    state.repos().orders.update_status(&id, status).await?;
    push_flash(
        &session,
        Flash::success(format!("Order marked as {}", status.label())),
    )
    .await;
    Ok(Redirect::to(&format!("/orders/{id}")))
}

/// Tracking form data. A blank value clears the tracking id.
#[derive(Debug, Deserialize)]
pub struct TrackingForm {
    #[serde(default)]
    pub tracking_id: String,
}

/// Set or clear an order's courier tracking id.
#[instrument(skip(_admin, state, session, form), fields(order_id = %id))]
pub async fn update_tracking(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<TrackingForm>,
) -> Result<Redirect> {
    let id = OrderId::new(id);
    let tracking = form.tracking_id.trim();
    state.repos().orders.update_tracking(&id, tracking).await?;
    let message = if tracking.is_empty() {
        "Tracking id cleared".to_string()
    } else {
        format!("Tracking id set to {tracking}")
    };
    push_flash(&session, Flash::success(message)).await;
    Ok(Redirect::to(&format!("/orders/{id}")))
}

/// Delete an order.
#[instrument(skip(_admin, state, session), fields(order_id = %id))]
pub async fn delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let id = OrderId::new(id);
    let order = state.repos().orders.require(&id).await?;
    state.repos().orders.delete(&id).await?;
    push_flash(
        &session,
        Flash::success(format!("Order #{} deleted", order.short_id())),
    )
    .await;
    Ok(Redirect::to("/orders"))
}

/// Printable invoice for any order.
#[instrument(skip(_admin, state), fields(order_id = %id))]
pub async fn invoice(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>> {
    let order = state.repos().orders.require(&OrderId::new(id)).await?;
    let template = InvoiceTemplate {
        company_name: COMPANY_NAME,
        company_tagline: COMPANY_TAGLINE,
        invoice: Invoice::from(&order),
    };
    Ok(Html(template.render()?))
}
