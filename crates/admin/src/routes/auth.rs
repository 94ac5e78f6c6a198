//! Admin authentication.
//!
//! Accounts live with the identity provider, the same one customers use.
//! Only emails on the `ADMIN_EMAILS` allowlist may sign in; others are
//! refused before their password is sent anywhere.

use askama::Template;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use innovacart_firebase::{AuthError, is_admin};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::auth::LOGIN_PATH;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::session::{push_flash, take_flash};
use crate::models::{CurrentAdmin, Flash};
use crate::state::AppState;

/// Shown when an email outside the allowlist tries to sign in.
pub const ACCESS_DENIED: &str = "Access denied. Admin privileges required.";

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
    pub flash: Option<Flash>,
}

fn login_page_with(status: StatusCode, email: String, error: String) -> Result<Response> {
    let template = LoginTemplate {
        email,
        error: Some(error),
        flash: None,
    };
    Ok((status, Html(template.render()?)).into_response())
}

/// Display the login page. Signed-in admins go to the dashboard.
pub async fn login_page(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    session: Session,
) -> Result<Response> {
    if admin.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let template = LoginTemplate {
        email: String::new(),
        error: None,
        flash: take_flash(&session).await,
    };
    Ok(Html(template.render()?).into_response())
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email.trim()))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = form.email.trim().to_lowercase();
    let allowlist = &state.config().admin_emails;

    if !is_admin(&email, allowlist) {
        warn!("Login refused for email outside the admin allowlist");
        return login_page_with(StatusCode::FORBIDDEN, form.email, ACCESS_DENIED.to_string());
    }

    match state.identity().sign_in(&email, &form.password).await {
        Ok(account) if is_admin(&account.email, allowlist) => {
            let admin = CurrentAdmin::from(&account);
            set_current_admin(&session, &admin).await?;
            set_sentry_user(&admin.uid, Some(&admin.email));
            info!(uid = %admin.uid, "Admin signed in");
            push_flash(&session, Flash::success(format!("Welcome back, {}", admin.name))).await;
            Ok(Redirect::to("/").into_response())
        }
        Ok(_) => {
            warn!("Provider returned an account outside the admin allowlist");
            login_page_with(StatusCode::FORBIDDEN, form.email, ACCESS_DENIED.to_string())
        }
        Err(e) if e.is_user_facing() => {
            warn!(error = %e, "Admin login failed");
            let status = match e {
                AuthError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::UNAUTHORIZED,
            };
            login_page_with(status, form.email, e.to_string())
        }
        Err(e) => Err(AppError::from(e)),
    }
}

/// Sign out and return to the login page.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    push_flash(&session, Flash::success("You have been signed out")).await;
    Ok(Redirect::to(LOGIN_PATH))
}
