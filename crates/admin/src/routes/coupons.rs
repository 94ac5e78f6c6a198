//! Coupon management route handlers.

#![allow(clippy::used_underscore_binding)]

use std::str::FromStr;

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use innovacart_core::coupon::{
    CODE_LENGTH, Coupon, CouponStatus, DEFAULT_MAX_USAGE, expiry_from_date, generate_code,
};
use innovacart_core::{CouponId, DiscountType, parse_amount};
use innovacart_firebase::RepositoryError;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::models::session::{push_flash, take_flash};
use crate::state::AppState;

use super::dashboard::AdminUserView;

/// Coupon row in the list table.
#[derive(Debug, Clone)]
pub struct CouponRow {
    pub id: String,
    pub code: String,
    pub description: String,
    pub usage: String,
    pub expires: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub is_active: bool,
    pub last_used: Option<String>,
}

impl CouponRow {
    fn new(coupon: &Coupon, now: chrono::DateTime<Utc>) -> Self {
        let status = coupon.status(now);
        Self {
            id: coupon.id.to_string(),
            code: coupon.code.clone(),
            description: coupon.describe(),
            usage: format!("{} / {}", coupon.used_count, coupon.max_usage),
            expires: coupon.expiry_date.format("%b %d, %Y").to_string(),
            status: status.label(),
            status_class: status_class(status),
            is_active: coupon.is_active,
            last_used: coupon
                .last_used
                .map(|at| at.format("%b %d, %Y %H:%M").to_string()),
        }
    }
}

const fn status_class(status: CouponStatus) -> &'static str {
    match status {
        CouponStatus::Active => "badge badge-delivered",
        CouponStatus::Inactive => "badge badge-muted",
        CouponStatus::Expired | CouponStatus::UsedUp => "badge badge-pending",
    }
}

/// Coupon form data. Fields stay as typed so a rejected form re-renders.
#[derive(Debug, Clone, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub discount: String,
    #[serde(default)]
    pub discount_type: String,
    #[serde(default)]
    pub max_usage: String,
    #[serde(default)]
    pub expiry_date: String,
}

impl Default for CouponForm {
    fn default() -> Self {
        Self {
            code: String::new(),
            discount: String::new(),
            discount_type: DiscountType::Percentage.as_str().to_string(),
            max_usage: String::new(),
            expiry_date: String::new(),
        }
    }
}

impl CouponForm {
    /// Build the coupon. A blank usage limit falls back to
    /// [`DEFAULT_MAX_USAGE`]; the expiry date is required.
    fn to_coupon(&self) -> std::result::Result<Coupon, String> {
        let discount = parse_amount(&self.discount).map_err(|e| format!("Discount: {e}"))?;
        let discount_type =
            DiscountType::from_str(&self.discount_type).map_err(|e| e.to_string())?;
        let max_usage = match self.max_usage.trim() {
            "" => DEFAULT_MAX_USAGE,
            value => value
                .parse()
                .map_err(|_| format!("Usage limit must be a whole number, got '{value}'"))?,
        };
        let expiry = self.expiry_date.trim();
        if expiry.is_empty() {
            return Err("Expiry date is required".to_string());
        }
        let date = NaiveDate::parse_from_str(expiry, "%Y-%m-%d")
            .map_err(|_| format!("'{expiry}' is not a valid date"))?;

        let coupon = Coupon::new(
            &self.code,
            discount,
            discount_type,
            max_usage,
            expiry_from_date(date),
        );
        coupon.validate().map_err(|e| e.to_string())?;
        Ok(coupon)
    }
}

/// Coupons page template (list plus create form).
#[derive(Template)]
#[template(path = "coupons/index.html")]
pub struct CouponsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub coupons: Vec<CouponRow>,
    pub form: CouponForm,
    pub error: Option<String>,
    pub code_length: usize,
    pub default_max_usage: u32,
}

/// Generated code fragment that replaces the code input.
#[derive(Template)]
#[template(path = "partials/coupon_code.html")]
pub struct CouponCodeTemplate {
    pub code: String,
    pub code_length: usize,
}

async fn render_index(
    state: &AppState,
    admin_user: AdminUserView,
    flash: Option<Flash>,
    form: CouponForm,
    error: Option<String>,
) -> Result<String> {
    let now = Utc::now();
    let coupons = state.repos().coupons.list().await?;
    let template = CouponsIndexTemplate {
        admin_user,
        current_path: "/coupons".to_string(),
        flash,
        coupons: coupons.iter().map(|c| CouponRow::new(c, now)).collect(),
        form,
        error,
        code_length: CODE_LENGTH,
        default_max_usage: DEFAULT_MAX_USAGE,
    };
    Ok(template.render()?)
}

/// Coupons page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>> {
    let flash = take_flash(&session).await;
    let body = render_index(
        &state,
        AdminUserView::from(&admin),
        flash,
        CouponForm::default(),
        None,
    )
    .await?;
    Ok(Html(body))
}

/// Create coupon handler.
#[instrument(skip(admin, state, session, form), fields(code = %form.code.trim()))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let (status, message) = match form.to_coupon() {
        Ok(coupon) => match state.repos().coupons.add(coupon).await {
            Ok(saved) => {
                info!(coupon_id = %saved.id, "Coupon created");
                push_flash(
                    &session,
                    Flash::success(format!("Coupon {} created ({})", saved.code, saved.describe())),
                )
                .await;
                return Ok(Redirect::to("/coupons").into_response());
            }
            Err(RepositoryError::Conflict(message)) => (StatusCode::CONFLICT, message),
            Err(RepositoryError::Coupon(e)) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            Err(e) => return Err(AppError::from(e)),
        },
        Err(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
    };

    let body = render_index(&state, AdminUserView::from(&admin), None, form, Some(message)).await?;
    Ok((status, Html(body)).into_response())
}

/// Flip a coupon between active and inactive.
#[instrument(skip(_admin, state, session), fields(coupon_id = %id))]
pub async fn toggle(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let id = CouponId::new(id);
    let coupon = state
        .repos()
        .coupons
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("coupon {id}")))?;
    let active = !coupon.is_active;
    state.repos().coupons.set_active(&id, active).await?;

    let verb = if active { "activated" } else { "deactivated" };
    push_flash(&session, Flash::success(format!("Coupon {} {verb}", coupon.code))).await;
    Ok(Redirect::to("/coupons"))
}

/// Delete a coupon.
#[instrument(skip(_admin, state, session), fields(coupon_id = %id))]
pub async fn delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let id = CouponId::new(id);
    let coupon = state
        .repos()
        .coupons
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("coupon {id}")))?;
    state.repos().coupons.delete(&id).await?;
    push_flash(&session, Flash::success(format!("Coupon {} deleted", coupon.code))).await;
    Ok(Redirect::to("/coupons"))
}

/// Fresh random code for the create form.
pub async fn generate(RequireAdminAuth(_admin): RequireAdminAuth) -> Result<Html<String>> {
    let template = CouponCodeTemplate {
        code: generate_code(&mut rand::rng()),
        code_length: CODE_LENGTH,
    };
    Ok(Html(template.render()?))
}
