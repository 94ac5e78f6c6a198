//! Connection settings shared by the binaries.
//!
//! Each binary reads these from its own environment; this module only
//! turns them into clients.

use secrecy::SecretString;

use crate::auth::{AuthError, IdentityClient};
use crate::database::{MEMORY_URL, RealtimeDatabase};
use crate::error::FirebaseError;

/// Firebase project configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct FirebaseConfig {
    /// Realtime Database URL or `memory://`
    pub database_url: String,
    /// Optional `auth` parameter for database requests
    pub database_secret: Option<SecretString>,
    /// Identity Toolkit web API key; `None` selects the in-memory accounts
    pub api_key: Option<SecretString>,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("database_url", &self.database_url)
            .field(
                "database_secret",
                &self.database_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl FirebaseConfig {
    /// In-process database and accounts, for local development and tests.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            database_url: MEMORY_URL.to_string(),
            database_secret: None,
            api_key: None,
        }
    }

    /// Whether the in-process database is selected.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.database_url.starts_with(MEMORY_URL)
    }

    /// Database client for the configured URL.
    ///
    /// # Errors
    ///
    /// Returns `FirebaseError` if the URL is invalid.
    pub fn database(&self) -> Result<RealtimeDatabase, FirebaseError> {
        RealtimeDatabase::connect(&self.database_url, self.database_secret.clone())
    }

    /// Account client. The in-process database always pairs with in-process
    /// accounts, as does a missing API key.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the HTTP client cannot be built.
    pub fn identity(&self) -> Result<IdentityClient, AuthError> {
        match &self.api_key {
            Some(key) if !self.is_memory() => IdentityClient::rest(key.clone()),
            _ => Ok(IdentityClient::memory()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let firebase = FirebaseConfig {
            database_url: "https://innovacart-default-rtdb.firebaseio.com".to_string(),
            database_secret: Some(SecretString::from("db-token-value".to_string())),
            api_key: Some(SecretString::from("AIzaSyKeyValue".to_string())),
        };
        let debug_output = format!("{firebase:?}");
        assert!(debug_output.contains("firebaseio.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("db-token-value"));
        assert!(!debug_output.contains("AIzaSyKeyValue"));
        assert!(!firebase.is_memory());
    }

    #[test]
    fn test_memory_pairs_with_memory_accounts() {
        let mut config = FirebaseConfig::memory();
        config.api_key = Some(SecretString::from("AIzaSyKeyValue".to_string()));
        assert!(config.is_memory());
        assert!(config.database().unwrap().is_memory());
        assert!(config.identity().unwrap().is_memory());
    }
}
