//! Authentication route handlers.
//!
//! Email/password accounts live with the identity provider; the session only
//! remembers who signed in. Signing out keeps the cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use innovacart_firebase::AuthError;
use innovacart_firebase::auth::validate_registration;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::session::push_flash;
use crate::models::{CurrentUser, Flash};
use crate::page::PageContext;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Where to go after signing in.
#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub redirect: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub email: String,
    pub redirect: String,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub name: String,
    pub email: String,
    pub error: Option<String>,
}

/// Local path to return to. Anything that could leave the site becomes `/`.
fn safe_redirect(target: Option<&str>) -> String {
    match target.map(str::trim) {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

/// Status for a form re-rendered after a provider error.
const fn auth_failure_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials | AuthError::UserDisabled => StatusCode::UNAUTHORIZED,
        AuthError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
        AuthError::EmailExists => StatusCode::CONFLICT,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

async fn sign_in_session(session: &Session, user: &CurrentUser) -> Result<()> {
    set_current_user(session, user).await?;
    set_sentry_user(&user.uid, Some(&user.email));
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<RedirectQuery>, page: PageContext) -> Response {
    if page.user.is_some() {
        return Redirect::to(&safe_redirect(query.redirect.as_deref())).into_response();
    }

    LoginTemplate {
        page,
        email: String::new(),
        redirect: safe_redirect(query.redirect.as_deref()),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, page, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let redirect = safe_redirect(form.redirect.as_deref());

    match state.identity().sign_in(&form.email, &form.password).await {
        Ok(account) => {
            let user = CurrentUser::from(&account);
            sign_in_session(&session, &user).await?;
            info!(uid = %user.uid, "Customer signed in");
            push_flash(&session, Flash::success(format!("Welcome back, {}!", user.name))).await;
            Ok(Redirect::to(&redirect).into_response())
        }
        Err(e) if e.is_user_facing() => {
            warn!(error = %e, "Login failed");
            let status = auth_failure_status(&e);
            Ok((
                status,
                LoginTemplate {
                    page,
                    email: form.email,
                    redirect,
                    error: Some(e.to_string()),
                },
            )
                .into_response())
        }
        Err(e) => Err(AppError::from(e)),
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(page: PageContext) -> Response {
    if page.user.is_some() {
        return Redirect::to("/").into_response();
    }

    RegisterTemplate {
        page,
        name: String::new(),
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle registration form submission. The new account is signed in.
#[instrument(skip(state, session, page, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let result = match validate_registration(&form.email, &form.password, &form.confirm_password)
    {
        Ok(email) => {
            state
                .identity()
                .sign_up(email.as_str(), &form.password, Some(&form.name))
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(account) => {
            let user = CurrentUser::from(&account);
            sign_in_session(&session, &user).await?;
            push_flash(&session, Flash::success("Your account has been created")).await;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) if e.is_user_facing() => {
            let status = auth_failure_status(&e);
            Ok((
                status,
                RegisterTemplate {
                    page,
                    name: form.name,
                    email: form.email,
                    error: Some(e.to_string()),
                },
            )
                .into_response())
        }
        Err(e) => Err(AppError::from(e)),
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Sign out, keeping the cart.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    session.cycle_id().await?;
    clear_sentry_user();
    push_flash(&session, Flash::success("You have been signed out")).await;
    Ok(Redirect::to("/"))
}
