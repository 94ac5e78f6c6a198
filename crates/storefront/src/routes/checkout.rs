//! Checkout route handlers.
//!
//! Payment is made out of band through a mobile wallet; the customer enters
//! the transaction reference and the order is stored as pending. The applied
//! coupon code is kept in the session and re-validated whenever totals are
//! shown and again when the order is placed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use innovacart_core::cart::Cart;
use innovacart_core::coupon::Coupon;
use innovacart_core::delivery::{DEFAULT_DISTRICT, DISTRICTS, DeliveryZone};
use innovacart_core::order::{CheckoutError, CheckoutForm, Order, OrderTotals, OrderUser};
use innovacart_core::{PaymentMethod, format_taka};
use innovacart_firebase::RepositoryError;

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::session::{
    applied_coupon, clear_applied_coupon, load_cart, push_flash, save_cart, set_applied_coupon,
};
use crate::models::{CurrentUser, Flash};
use crate::page::PageContext;
use crate::routes::cart::CartView;
use crate::state::AppState;

/// District choice in the delivery form.
#[derive(Debug, Clone)]
pub struct DistrictOption {
    pub name: &'static str,
    pub selected: bool,
}

/// Wallet choice with the number to send money to.
#[derive(Debug, Clone)]
pub struct PaymentOption {
    pub value: &'static str,
    pub number: String,
    pub selected: bool,
}

/// Money figures shown beside the form.
#[derive(Debug, Clone)]
pub struct SummaryView {
    pub subtotal: String,
    pub zone: &'static str,
    pub delivery_charge: String,
    pub discount: Option<String>,
    pub coupon_code: Option<String>,
    pub coupon_description: Option<String>,
    pub grand_total: String,
}

impl SummaryView {
    fn new(totals: OrderTotals, district: &str, coupon: Option<&Coupon>) -> Self {
        Self {
            subtotal: format_taka(totals.subtotal),
            zone: DeliveryZone::for_district(district).label(),
            delivery_charge: format_taka(totals.delivery_charge),
            discount: (!totals.discount.is_zero())
                .then(|| format!("-{}", format_taka(totals.discount))),
            coupon_code: coupon.map(|c| c.code.clone()),
            coupon_description: coupon.map(Coupon::describe),
            grand_total: format_taka(totals.grand_total),
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub form: CheckoutForm,
    pub districts: Vec<DistrictOption>,
    pub payment_options: Vec<PaymentOption>,
    pub summary: SummaryView,
    pub error: Option<String>,
}

/// Order summary fragment (for HTMX), refreshed when the district changes.
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_summary.html")]
pub struct CheckoutSummaryTemplate {
    pub summary: SummaryView,
}

/// Guest order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/placed.html")]
pub struct OrderPlacedTemplate {
    pub page: PageContext,
    pub reference: String,
    pub email: String,
    pub grand_total: String,
    pub payment_method: &'static str,
    pub transaction_id: String,
}

/// Coupon form data.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub code: String,
}

/// Query for the summary fragment.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub district: Option<String>,
}

/// Outcome of re-checking the session's coupon: the coupon with its
/// discount, or the reason it was dropped.
type CouponCheck = std::result::Result<Option<(Coupon, Decimal)>, String>;

/// The session's coupon applied to `cart`.
///
/// A coupon that no longer validates is dropped from the session and its
/// reason returned as the error message.
async fn session_coupon(
    state: &AppState,
    session: &Session,
    cart: &Cart,
) -> Result<CouponCheck> {
    let Some(code) = applied_coupon(session).await else {
        return Ok(Ok(None));
    };

    match state.repos().coupons.apply(&code, cart.total(), Utc::now()).await {
        Ok(applied) => Ok(Ok(Some(applied))),
        Err(RepositoryError::Coupon(reason)) => {
            clear_applied_coupon(session).await?;
            Ok(Err(reason.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

fn summary_for(cart: &Cart, district: &str, coupon: Option<&(Coupon, Decimal)>) -> SummaryView {
    let discount = coupon.map_or(Decimal::ZERO, |(_, d)| *d);
    let totals = OrderTotals::for_cart(cart, district, discount);
    SummaryView::new(totals, district, coupon.map(|(c, _)| c))
}

fn prefilled_form(user: Option<&CurrentUser>) -> CheckoutForm {
    CheckoutForm {
        name: user.map(|u| u.name.clone()).unwrap_or_default(),
        email: user.map(|u| u.email.clone()).unwrap_or_default(),
        district: DEFAULT_DISTRICT.to_string(),
        payment_method: PaymentMethod::default().as_str().to_string(),
        ..CheckoutForm::default()
    }
}

/// Render the checkout form with the given values and message.
async fn render_form(
    state: &AppState,
    session: &Session,
    page: PageContext,
    cart: &Cart,
    form: CheckoutForm,
    error: Option<String>,
) -> Result<CheckoutTemplate> {
    let (coupon, coupon_error) = match session_coupon(state, session, cart).await? {
        Ok(coupon) => (coupon, None),
        Err(reason) => (None, Some(reason)),
    };
    let settings = state.repos().settings.get().await;
    let chosen = form.method();

    Ok(CheckoutTemplate {
        cart: CartView::from(cart),
        districts: DISTRICTS
            .into_iter()
            .map(|name| DistrictOption {
                name,
                selected: name == form.district.trim(),
            })
            .collect(),
        payment_options: PaymentMethod::ALL
            .into_iter()
            .map(|method| PaymentOption {
                value: method.as_str(),
                number: settings.payment_number(method),
                selected: method == chosen,
            })
            .collect(),
        summary: summary_for(cart, &form.district, coupon.as_ref()),
        error: error.or(coupon_error),
        form,
        page,
    })
}

/// Display the checkout form. An empty cart sends the customer back to it.
#[instrument(skip(state, session, user, page))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    page: PageContext,
) -> Result<Response> {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let form = prefilled_form(user.as_ref());
    Ok(render_form(&state, &session, page, &cart, form, None)
        .await?
        .into_response())
}

/// Order summary for a district (HTMX).
#[instrument(skip(state, session))]
pub async fn summary(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse> {
    let cart = load_cart(&session).await;
    let district = query
        .district
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DISTRICT.to_string());
    let coupon = session_coupon(&state, &session, &cart).await?.ok().flatten();

    Ok(CheckoutSummaryTemplate {
        summary: summary_for(&cart, &district, coupon.as_ref()),
    })
}

/// Apply a coupon code to the session.
#[instrument(skip(state, session))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CouponForm>,
) -> Result<Redirect> {
    let cart = load_cart(&session).await;

    match state
        .repos()
        .coupons
        .apply(&form.code, cart.total(), Utc::now())
        .await
    {
        Ok((coupon, _)) => {
            set_applied_coupon(&session, &coupon.code).await?;
            add_breadcrumb("checkout", "Coupon applied", Some(&[("code", coupon.code.as_str())]));
            push_flash(
                &session,
                Flash::success(format!("Coupon {} applied: {}", coupon.code, coupon.describe())),
            )
            .await;
        }
        Err(RepositoryError::Coupon(reason)) => {
            push_flash(&session, Flash::error(reason.to_string())).await;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to("/checkout"))
}

/// Drop the applied coupon.
#[instrument(skip(session))]
pub async fn remove_coupon(session: Session) -> Result<Redirect> {
    clear_applied_coupon(&session).await?;
    push_flash(&session, Flash::success("Coupon removed")).await;
    Ok(Redirect::to("/checkout"))
}

/// First cart line that can no longer be sold in the quantity asked for,
/// checked against the stored product rather than the cached one.
async fn stock_problem(state: &AppState, cart: &Cart) -> Result<Option<String>> {
    for item in &cart.items {
        let Some(product) = state.repos().products.get_fresh(&item.product.id).await? else {
            return Ok(Some(format!("{} is no longer available", item.product.name)));
        };
        let variant = match &item.selected_variant {
            Some(selected) => match product.variant(&selected.id) {
                Some(variant) => Some(variant),
                None => {
                    return Ok(Some(format!(
                        "{} ({}) is no longer available",
                        product.name, selected.name
                    )));
                }
            },
            None => None,
        };
        if let Err(e) = product.check_stock(variant, item.quantity) {
            warn!(product_id = %product.id, error = %e, "Checkout blocked by stock");
            return Ok(Some(e.to_string()));
        }
    }
    Ok(None)
}

/// Place the order.
///
/// Every line is re-checked against current stock, and the coupon against
/// its rules, before anything is stored. The coupon is redeemed once the
/// order is stored. Signed-in customers land
/// on their order history; guests get a confirmation page.
#[instrument(skip(state, session, user, page, form))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    page: PageContext,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        push_flash(&session, Flash::error(CheckoutError::EmptyCart.to_string())).await;
        return Ok(Redirect::to("/cart").into_response());
    }

    if let Err(e) = form.validate() {
        let template = render_form(&state, &session, page, &cart, form, Some(e.to_string())).await?;
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
    }

    if let Some(problem) = stock_problem(&state, &cart).await? {
        let template = render_form(&state, &session, page, &cart, form, Some(problem)).await?;
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
    }

    let coupon = match session_coupon(&state, &session, &cart).await? {
        Ok(coupon) => coupon,
        Err(reason) => {
            let template = render_form(&state, &session, page, &cart, form, Some(reason)).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
        }
    };

    let payment_number = state.repos().settings.get().await.payment_number(form.method());
    let order = Order::from_cart(
        &cart,
        user.as_ref().map(OrderUser::from),
        form.customer_info(),
        form.payment_info(&payment_number),
        coupon.as_ref().map(|(c, d)| (c, *d)),
    );
    let order = state.repos().orders.add(order).await?;

    if let Some(code) = &order.coupon_code
        && let Err(e) = state.repos().coupons.redeem(code).await
    {
        warn!(order_id = %order.id, code = %code, error = %e, "Failed to record coupon use");
    }

    save_cart(&session, &Cart::new()).await?;
    clear_applied_coupon(&session).await?;

    info!(
        order_id = %order.id,
        grand_total = %order.grand_total,
        guest = order.is_guest(),
        "Order placed"
    );
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.id.as_str())]));

    if user.is_some() {
        push_flash(
            &session,
            Flash::success(format!(
                "Order #{} placed. We will confirm your payment shortly.",
                order.short_id()
            )),
        )
        .await;
        return Ok(Redirect::to("/orders").into_response());
    }

    Ok(OrderPlacedTemplate {
        page,
        reference: order.short_id(),
        email: order.customer_info.email.clone(),
        grand_total: format_taka(order.amount_due()),
        payment_method: order.payment_info.method.as_str(),
        transaction_id: order.payment_info.transaction_id.clone(),
    }
    .into_response())
}
