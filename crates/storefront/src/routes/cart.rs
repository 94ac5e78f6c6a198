//! Cart route handlers.
//!
//! The cart lives in the session. Mutations answer HTMX requests with a
//! fragment plus an `HX-Trigger: cart-updated` header, and plain form posts
//! with a redirect back to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Deserializer};
use tower_sessions::Session;
use tracing::instrument;

use innovacart_core::cart::{Cart, CartItem};
use innovacart_core::{ProductId, VariantId, format_taka};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::Flash;
use crate::models::session::{load_cart, push_flash, save_cart};
use crate::page::PageContext;
use crate::state::AppState;

/// Header value telling the page to refresh cart widgets.
const CART_UPDATED: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub variant: Option<String>,
    pub image: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.clone(),
            product_id: item.product.id.to_string(),
            name: item.product.name.clone(),
            variant: item.selected_variant.as_ref().map(|v| v.name.clone()),
            image: item.product.image.clone(),
            quantity: item.quantity,
            unit_price: format_taka(item.unit_price()),
            line_total: format_taka(item.line_total()),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items.iter().map(CartItemView::from).collect(),
            subtotal: format_taka(cart.total()),
            item_count: cart.item_count(),
        }
    }
}

/// Deserialize a blank quantity field as None.
fn empty_string_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Add to cart form data. A missing or blank quantity means one.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    #[serde(default)]
    pub variant_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub quantity: Option<u32>,
}

/// Update cart form data. Zero or less removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Items fragment for HTMX, redirect to the cart page otherwise.
fn items_response(headers: &HeaderMap, cart: &Cart) -> Response {
    if is_htmx(headers) {
        (
            AppendHeaders([CART_UPDATED]),
            CartItemsTemplate {
                cart: CartView::from(cart),
            },
        )
            .into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

/// Display cart page.
#[instrument(skip(session, page))]
pub async fn show(session: Session, page: PageContext) -> impl IntoResponse {
    let cart = load_cart(&session).await;
    CartShowTemplate {
        page,
        cart: CartView::from(&cart),
    }
}

/// Add a product to the cart.
///
/// Products with variants use the chosen variant, or the default one when
/// none was posted (the first variant with stock if the default is sold out).
/// The line's new quantity may not exceed the stock on hand.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = state
        .repos()
        .products
        .require(&ProductId::new(form.product_id))
        .await?;

    let variant = match form.variant_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => Some(
            product
                .variant(&VariantId::new(id))
                .ok_or_else(|| AppError::BadRequest("Unknown product option".to_string()))?,
        ),
        _ if product.has_variants => product.purchasable_variant(),
        _ => None,
    };

    let quantity = form.quantity.unwrap_or(1);
    let mut cart = load_cart(&session).await;
    let in_cart = cart.quantity_of(&CartItem::key(&product.id, variant));
    product
        .check_stock(variant, in_cart.saturating_add(quantity))
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    cart.add(&product, quantity, variant);
    save_cart(&session, &cart).await?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product.id.as_str())]));

    if is_htmx(&headers) {
        return Ok((
            AppendHeaders([CART_UPDATED]),
            CartCountTemplate {
                count: cart.item_count(),
            },
        )
            .into_response());
    }

    push_flash(
        &session,
        Flash::success(format!("{} has been added to your cart", product.name)),
    )
    .await;
    Ok(Redirect::to("/cart").into_response())
}

/// Update cart line quantity.
#[instrument(skip(session, headers))]
pub async fn update(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await;
    cart.update_quantity(&form.item_id, form.quantity);
    save_cart(&session, &cart).await?;
    Ok(items_response(&headers, &cart))
}

/// Remove a line from the cart.
#[instrument(skip(session, headers))]
pub async fn remove(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await;
    if cart.remove(&form.item_id) {
        save_cart(&session, &cart).await?;
    }
    Ok(items_response(&headers, &cart))
}

/// Empty the cart.
#[instrument(skip(session, headers))]
pub async fn clear(session: Session, headers: HeaderMap) -> Result<Response> {
    let mut cart = load_cart(&session).await;
    cart.clear();
    save_cart(&session, &cart).await?;
    Ok(items_response(&headers, &cart))
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    CartCountTemplate {
        count: load_cart(&session).await.item_count(),
    }
}
