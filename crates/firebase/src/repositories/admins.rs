//! Admin roster at `admins/admin_{n}`.
//!
//! The roster mirrors the configured allowlist so the database rules can
//! check admin writes. Access decisions in the binaries use the allowlist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::now_millis;
use crate::database::RealtimeDatabase;
use crate::error::RepositoryError;

const PATH: &str = "admins";

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRecord {
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

fn default_role() -> String {
    "admin".to_string()
}

#[derive(Debug, Clone)]
pub struct AdminRepository {
    db: RealtimeDatabase,
}

impl AdminRepository {
    #[must_use]
    pub const fn new(db: RealtimeDatabase) -> Self {
        Self { db }
    }

    /// Write the roster from `emails` unless one already exists.
    ///
    /// Returns whether anything was written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read or write fails.
    #[instrument(skip(self, emails), fields(count = emails.len()))]
    pub async fn initialize(&self, emails: &[String]) -> Result<bool, RepositoryError> {
        if !self.db.get_value(PATH).await?.is_null() {
            info!("Admin roster already present");
            return Ok(false);
        }

        let created_at = now_millis();
        let roster: serde_json::Map<String, serde_json::Value> = emails
            .iter()
            .enumerate()
            .map(|(i, email)| {
                let record = AdminRecord {
                    email: email.trim().to_lowercase(),
                    role: default_role(),
                    created_at,
                };
                serde_json::to_value(record).map(|v| (format!("admin_{i}"), v))
            })
            .collect::<Result<_, _>>()
            .map_err(crate::error::FirebaseError::from)?;

        if roster.is_empty() {
            return Ok(false);
        }
        self.db.set(PATH, &roster).await?;
        info!("Admin roster initialised");
        Ok(true)
    }

    /// Roster entries ordered by key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    pub async fn list(&self) -> Result<Vec<AdminRecord>, RepositoryError> {
        let mut entries = self.db.list::<AdminRecord>(PATH).await?;
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries.into_iter().map(|(_, record)| record).collect())
    }
}
