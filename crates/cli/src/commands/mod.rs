//! Command implementations.
//!
//! Every command takes the repositories it works on, so tests run them
//! against the in-memory database.

pub mod admins;
pub mod check;
pub mod coupons;
pub mod settings;

use secrecy::SecretString;
use thiserror::Error;

use innovacart_firebase::{FirebaseConfig, FirebaseError, Repositories, RepositoryError};

/// Errors shared by the commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database client could not be built.
    #[error("Database client error: {0}")]
    Client(#[from] FirebaseError),

    /// Repository operation failed.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Invalid input.
    #[error("{0}")]
    Invalid(String),
}

/// Connect to the database named by `FIREBASE_DATABASE_URL`.
///
/// # Errors
///
/// Returns `CliError` if the variable is missing or the URL is invalid.
pub fn connect() -> Result<Repositories, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("FIREBASE_DATABASE_URL")
        .map_err(|_| CliError::MissingEnvVar("FIREBASE_DATABASE_URL"))?;
    let config = FirebaseConfig {
        database_url,
        database_secret: std::env::var("FIREBASE_DATABASE_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(SecretString::from),
        api_key: None,
    };
    if config.is_memory() {
        tracing::warn!("Using the in-process database; changes are discarded on exit");
    }

    Ok(Repositories::new(config.database()?))
}
