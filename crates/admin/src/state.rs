//! Application state shared across handlers.

use std::sync::Arc;

use innovacart_firebase::{AuthError, FirebaseError, IdentityClient, RealtimeDatabase, Repositories};

use crate::cloudinary::CloudinaryClient;
use crate::config::AdminConfig;

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
    config: AdminConfig,
    repos: Repositories,
    identity: IdentityClient,
    cloudinary: Option<CloudinaryClient>,
}

impl AppState {
    /// Connect to the configured database, identity provider and image host.
    ///
    /// # Errors
    ///
    /// Returns an error if the database URL or identity endpoint is invalid.
    pub fn new(config: AdminConfig) -> Result<Self, StateError> {
        let database = config.firebase.database()?;
        let identity = config.firebase.identity()?;
        let cloudinary = config.cloudinary.as_ref().map(CloudinaryClient::new);
        Ok(Self::from_parts(config, database, identity, cloudinary))
    }

    /// Build state around existing clients.
    ///
    /// Admin reads always go to the database; edits must show up immediately.
    #[must_use]
    pub fn from_parts(
        config: AdminConfig,
        database: RealtimeDatabase,
        identity: IdentityClient,
        cloudinary: Option<CloudinaryClient>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                repos: Repositories::new(database),
                config,
                identity,
                cloudinary,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
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

    /// Image uploads, when configured.
    #[must_use]
    pub fn cloudinary(&self) -> Option<&CloudinaryClient> {
        self.inner.cloudinary.as_ref()
    }
}
