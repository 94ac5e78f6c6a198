//! Admin roster commands.
//!
//! Sign-in is governed by `ADMIN_EMAILS`; the roster in the database records
//! who was configured, for reference by other tools.

use innovacart_admin::config::parse_admin_emails;
use innovacart_firebase::Repositories;

use super::CliError;

/// Read and validate `ADMIN_EMAILS`.
///
/// # Errors
///
/// Returns `CliError` if the variable is missing or holds no valid address.
pub fn emails_from_env() -> Result<Vec<String>, CliError> {
    let raw =
        std::env::var("ADMIN_EMAILS").map_err(|_| CliError::MissingEnvVar("ADMIN_EMAILS"))?;
    parse_admin_emails(&raw).map_err(|e| CliError::Invalid(e.to_string()))
}

/// Write the roster if none exists yet.
///
/// # Errors
///
/// Returns `CliError::Repository` if the read or write fails.
pub async fn init(repos: &Repositories, emails: &[String]) -> Result<bool, CliError> {
    let created = repos.admins.initialize(emails).await?;
    if created {
        tracing::info!(count = emails.len(), "Admin roster created");
    } else {
        tracing::info!("Admin roster already exists; nothing changed");
    }
    Ok(created)
}

/// Print the stored roster.
///
/// # Errors
///
/// Returns `CliError::Repository` if the read fails.
pub async fn list(repos: &Repositories) -> Result<(), CliError> {
    let admins = repos.admins.list().await?;
    if admins.is_empty() {
        tracing::info!("No admin roster stored. Run `ic-cli admins init`.");
    }
    for admin in admins {
        tracing::info!(
            "{} ({}) since {}",
            admin.email,
            admin.role,
            admin.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use innovacart_firebase::RealtimeDatabase;

    #[tokio::test]
    async fn test_init_only_once() {
        let repos = Repositories::new(RealtimeDatabase::memory());
        let emails = vec!["owner@innovacart.test".to_string()];

        assert!(init(&repos, &emails).await.unwrap());
        assert!(!init(&repos, &["other@innovacart.test".to_string()]).await.unwrap());

        let stored = repos.admins.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.first().unwrap().email, "owner@innovacart.test");
    }
}
