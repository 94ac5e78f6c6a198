//! Email/password accounts through the Identity Toolkit API.
//!
//! The REST transport calls `accounts:signUp`, `accounts:signInWithPassword`
//! and `accounts:update`. The memory transport keeps Argon2id password hashes
//! in process for development and tests, and reports the same errors the
//! provider does.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use innovacart_core::{Email, UserId};

use crate::error::excerpt;

/// Default Identity Toolkit endpoint.
pub const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Minimum password length the provider accepts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication failures, phrased for display to the person signing in.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Password should be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("An account with this email already exists")]
    EmailExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("This account has been disabled")]
    UserDisabled,

    #[error("Too many attempts. Please try again later")]
    TooManyAttempts,

    /// Provider returned an error code we do not map.
    #[error("authentication provider error: {0}")]
    Provider(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Map an Identity Toolkit error message such as
    /// `WEAK_PASSWORD : Password should be at least 6 characters`.
    #[must_use]
    pub fn from_provider_code(message: &str) -> Self {
        let code = message.split(':').next().unwrap_or_default().trim();
        match code {
            "EMAIL_EXISTS" => Self::EmailExists,
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                Self::InvalidCredentials
            }
            "WEAK_PASSWORD" => Self::WeakPassword,
            "INVALID_EMAIL" => Self::InvalidEmail,
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            other => Self::Provider(other.to_string()),
        }
    }

    /// Whether the message can be shown as-is on a form.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Self::Provider(_) | Self::Http(_) | Self::Json(_) | Self::PasswordHash
        )
    }
}

/// A signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
    /// Provider ID token. Empty for the memory transport.
    #[serde(skip)]
    pub id_token: String,
}

impl AuthUser {
    /// Name to greet the user with.
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.email.split('@').next())
            .unwrap_or("Customer")
    }
}

/// Case-insensitive membership of `email` in the configured admin list.
#[must_use]
pub fn is_admin(email: &str, admin_emails: &[String]) -> bool {
    let email = email.trim();
    !email.is_empty() && admin_emails.iter().any(|a| a.trim().eq_ignore_ascii_case(email))
}

/// Check a registration form before contacting the provider.
///
/// # Errors
///
/// Returns `InvalidEmail`, `WeakPassword` or `PasswordMismatch`.
pub fn validate_registration(
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<Email, AuthError> {
    let email = Email::parse(email).map_err(|_| AuthError::InvalidEmail)?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword);
    }
    if password != confirm_password {
        return Err(AuthError::PasswordMismatch);
    }
    Ok(email)
}

/// Identity Toolkit client. Cheap to clone.
#[derive(Clone)]
pub struct IdentityClient {
    transport: IdentityTransport,
}

#[derive(Clone)]
enum IdentityTransport {
    Rest(Arc<RestIdentity>),
    Memory(Arc<MemoryIdentity>),
}

struct RestIdentity {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

#[derive(Default)]
struct MemoryIdentity {
    accounts: RwLock<HashMap<String, MemoryAccount>>,
}

struct MemoryAccount {
    uid: UserId,
    email: String,
    display_name: Option<String>,
    password_hash: String,
    disabled: bool,
}

impl std::fmt::Debug for IdentityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match self.transport {
            IdentityTransport::Rest(_) => "rest",
            IdentityTransport::Memory(_) => "memory",
        };
        f.debug_struct("IdentityClient")
            .field("backend", &backend)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Deserialize)]
struct ProviderError {
    message: String,
}

impl IdentityClient {
    /// Client for the hosted Identity Toolkit.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Http` if the HTTP client cannot be built.
    pub fn rest(api_key: SecretString) -> Result<Self, AuthError> {
        Self::rest_with_endpoint(api_key, IDENTITY_TOOLKIT_URL)
    }

    /// Client for an Identity Toolkit compatible endpoint (such as the emulator).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Http` if the HTTP client cannot be built.
    pub fn rest_with_endpoint(api_key: SecretString, endpoint: &str) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            transport: IdentityTransport::Rest(Arc::new(RestIdentity {
                client,
                endpoint: endpoint.trim_end_matches('/').to_string(),
                api_key,
            })),
        })
    }

    /// In-process accounts.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            transport: IdentityTransport::Memory(Arc::new(MemoryIdentity::default())),
        }
    }

    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self.transport, IdentityTransport::Memory(_))
    }

    /// Create an account and sign it in. Sets the display name when given.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailExists`, `WeakPassword`, `InvalidEmail`, or a
    /// transport error.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidEmail)?;
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }
        let display_name = display_name.map(str::trim).filter(|n| !n.is_empty());

        let user = match &self.transport {
            IdentityTransport::Rest(rest) => {
                let mut user = rest
                    .call(
                        "accounts:signUp",
                        &CredentialsRequest {
                            email: email.as_str(),
                            password,
                            return_secure_token: true,
                        },
                    )
                    .await?;
                if let Some(name) = display_name {
                    rest.update_profile(&user.id_token, name).await?;
                    user.display_name = Some(name.to_string());
                }
                user
            }
            IdentityTransport::Memory(memory) => {
                memory.sign_up(&email, password, display_name).await?
            }
        };

        info!(uid = %user.uid, "Account created");
        Ok(user)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials`, `UserDisabled`,
    /// `TooManyAttempts`, or a transport error.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        match &self.transport {
            IdentityTransport::Rest(rest) => {
                rest.call(
                    "accounts:signInWithPassword",
                    &CredentialsRequest {
                        email: email.as_str(),
                        password,
                        return_secure_token: true,
                    },
                )
                .await
            }
            IdentityTransport::Memory(memory) => memory.sign_in(&email, password).await,
        }
    }

    /// Disable an in-memory account. No effect on the REST transport.
    pub async fn disable(&self, email: &str) {
        if let IdentityTransport::Memory(memory) = &self.transport {
            let mut accounts = memory.accounts.write().await;
            if let Some(account) = accounts.get_mut(&email.trim().to_lowercase()) {
                account.disabled = true;
            }
        }
    }
}

impl RestIdentity {
    async fn call<B: Serialize + Sync>(&self, action: &str, body: &B) -> Result<AuthUser, AuthError> {
        let url = url::Url::parse_with_params(
            &format!("{}/{action}", self.endpoint),
            &[("key", self.api_key.expose_secret())],
        )
        .map_err(|e| AuthError::Provider(format!("invalid endpoint: {e}")))?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let error = serde_json::from_str::<ProviderErrorBody>(&text).map_or_else(
                |_| AuthError::Provider(format!("HTTP {status}: {}", excerpt(&text))),
                |body| AuthError::from_provider_code(&body.error.message),
            );
            if !error.is_user_facing() {
                warn!(action, status = %status, body = %excerpt(&text), "Identity Toolkit request failed");
            }
            return Err(error);
        }

        let account: AccountResponse = serde_json::from_str(&text)?;
        Ok(AuthUser {
            uid: UserId::new(account.local_id),
            email: account.email,
            display_name: account.display_name.filter(|n| !n.is_empty()),
            id_token: account.id_token.unwrap_or_default(),
        })
    }

    async fn update_profile(&self, id_token: &str, display_name: &str) -> Result<(), AuthError> {
        self.call(
            "accounts:update",
            &UpdateProfileRequest {
                id_token,
                display_name,
                return_secure_token: false,
            },
        )
        .await
        .map(|_| ())
    }
}

impl MemoryIdentity {
    async fn sign_up(
        &self,
        email: &Email,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, AuthError> {
        let key = email.normalized();
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Err(AuthError::EmailExists);
        }

        let account = MemoryAccount {
            uid: UserId::new(uuid::Uuid::new_v4().simple().to_string()),
            email: email.as_str().to_string(),
            display_name: display_name.map(str::to_string),
            password_hash: hash_password(password)?,
            disabled: false,
        };
        let user = account.to_user();
        accounts.insert(key, account);
        Ok(user)
    }

    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthUser, AuthError> {
        let accounts = self.accounts.read().await;
        let account = accounts
            .get(&email.normalized())
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, &account.password_hash)?;
        if account.disabled {
            return Err(AuthError::UserDisabled);
        }
        Ok(account.to_user())
    }
}

impl MemoryAccount {
    fn to_user(&self) -> AuthUser {
        AuthUser {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            id_token: String::new(),
        }
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}
