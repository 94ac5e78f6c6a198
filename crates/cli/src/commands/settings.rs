//! Site settings commands.

use innovacart_firebase::Repositories;

use super::CliError;

/// Print the settings record, with defaults filled in.
///
/// # Errors
///
/// Returns `CliError::Invalid` if the record cannot be serialized.
pub async fn show(repos: &Repositories) -> Result<(), CliError> {
    let settings = repos.settings.get().await;
    let json = serde_json::to_string_pretty(&settings)
        .map_err(|e| CliError::Invalid(e.to_string()))?;
    tracing::info!("Site settings:\n{json}");
    Ok(())
}

/// Overwrite the settings record with defaults.
///
/// # Errors
///
/// Returns `CliError::Repository` if the write fails.
pub async fn reset(repos: &Repositories) -> Result<(), CliError> {
    let settings = repos.settings.reset().await?;
    tracing::info!(
        it_solutions = settings.it_solutions_available,
        tshirts = settings.tshirt_page_available,
        "Site settings reset to defaults"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use innovacart_core::settings::SiteSettings;
    use innovacart_firebase::RealtimeDatabase;

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let repos = Repositories::new(RealtimeDatabase::memory());
        let mut settings = SiteSettings::default();
        settings.tshirt_page_available = false;
        repos.settings.update(&settings).await.unwrap();

        reset(&repos).await.unwrap();
        assert_eq!(repos.settings.get().await, SiteSettings::default());
        show(&repos).await.unwrap();
    }
}
