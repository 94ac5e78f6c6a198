//! Order history and invoices for the signed-in customer.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use innovacart_core::invoice::{COMPANY_NAME, COMPANY_TAGLINE, Invoice};
use innovacart_core::order::Order;
use innovacart_core::{OrderId, format_taka};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::page::PageContext;
use crate::state::AppState;

/// Order row in the history list.
#[derive(Debug, Clone)]
pub struct OrderSummaryView {
    pub id: String,
    pub reference: String,
    pub date: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub item_count: u32,
    pub items: Vec<String>,
    pub grand_total: String,
    pub tracking_id: Option<String>,
}

impl From<&Order> for OrderSummaryView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            reference: order.short_id(),
            date: order.created_at.format("%b %d, %Y").to_string(),
            status: order.status.label(),
            status_class: order.status.badge_class(),
            item_count: order.item_count(),
            items: order
                .items
                .iter()
                .map(|item| match &item.product.variant {
                    Some(v) => format!("{} ({}) × {}", item.product.name, v.name, item.quantity),
                    None => format!("{} × {}", item.product.name, item.quantity),
                })
                .collect(),
            grand_total: format_taka(order.amount_due()),
            tracking_id: order.tracking_id.clone().filter(|t| !t.trim().is_empty()),
        }
    }
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderSummaryView>,
}

/// Printable invoice template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/invoice.html")]
pub struct InvoiceTemplate {
    pub company_name: &'static str,
    pub company_tagline: &'static str,
    pub invoice: Invoice,
}

/// List the customer's orders, newest first.
#[instrument(skip(state, user, page), fields(user_id = %user.uid))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let orders = state.repos().orders.for_user(&user.uid).await?;

    Ok(OrdersTemplate {
        page,
        orders: orders.iter().map(OrderSummaryView::from).collect(),
    })
}

/// Invoice for one of the customer's own orders.
///
/// Orders belonging to anyone else are reported as missing.
#[instrument(skip(state, user), fields(user_id = %user.uid))]
pub async fn invoice(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = OrderId::new(id);
    let order = state
        .repos()
        .orders
        .get(&id)
        .await?
        .filter(|order| order.belongs_to(&user.uid))
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    Ok(InvoiceTemplate {
        company_name: COMPANY_NAME,
        company_tagline: COMPANY_TAGLINE,
        invoice: Invoice::from(&order),
    })
}
