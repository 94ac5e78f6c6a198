//! Application state shared across handlers.

use std::sync::Arc;

use innovacart_firebase::{
    AuthError, FirebaseError, IdentityClient, RealtimeDatabase, Repositories,
};

use crate::config::StorefrontConfig;

/// Error connecting the backend clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("database client: {0}")]
    Database(#[from] FirebaseError),
    #[error("identity client: {0}")]
    Identity(#[from] AuthError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    repos: Repositories,
    identity: IdentityClient,
}

impl AppState {
    /// Connect to the configured database and identity provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the database URL or identity endpoint is invalid.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let database = config.firebase.database()?;
        let identity = config.firebase.identity()?;
        Ok(Self::from_parts(config, database, identity))
    }

    /// Build state around existing clients.
    #[must_use]
    pub fn from_parts(
        config: StorefrontConfig,
        database: RealtimeDatabase,
        identity: IdentityClient,
    ) -> Self {
        let repos = Repositories::cached(database, config.cache_ttl);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                repos,
                identity,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Typed access to the database.
    #[must_use]
    pub fn repos(&self) -> &Repositories {
        &self.inner.repos
    }

    /// Email/password accounts.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }
}
