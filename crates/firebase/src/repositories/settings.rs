//! Site settings at `settings`.

use tracing::{instrument, warn};

use innovacart_core::settings::SiteSettings;

use super::cache::{CacheKey, CacheValue, CatalogCache};
use crate::database::RealtimeDatabase;
use crate::error::{FirebaseError, RepositoryError};

const PATH: &str = "settings";

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    db: RealtimeDatabase,
    cache: Option<CatalogCache>,
}

impl SettingsRepository {
    #[must_use]
    pub const fn new(db: RealtimeDatabase, cache: Option<CatalogCache>) -> Self {
        Self { db, cache }
    }

    /// Current settings.
    ///
    /// An absent record is created with defaults and missing sections are
    /// backfilled and written back. Read failures fall back to defaults so
    /// pages still render.
    #[instrument(skip(self))]
    pub async fn get(&self) -> SiteSettings {
        if let Some(cache) = &self.cache
            && let Some(CacheValue::Settings(settings)) = cache.get(&CacheKey::Settings).await
        {
            return *settings;
        }

        match self.load().await {
            Ok(settings) => {
                if let Some(cache) = &self.cache {
                    cache
                        .insert(CacheKey::Settings, CacheValue::Settings(Box::new(settings.clone())))
                        .await;
                }
                settings
            }
            Err(e) => {
                warn!(error = %e, "Failed to read site settings, using defaults");
                SiteSettings::default()
            }
        }
    }

    async fn load(&self) -> Result<SiteSettings, FirebaseError> {
        let Some(mut settings) = self.db.get::<SiteSettings>(PATH).await? else {
            let defaults = SiteSettings::default();
            if let Err(e) = self.db.set(PATH, &defaults).await {
                warn!(error = %e, "Could not store default site settings");
            }
            return Ok(defaults);
        };

        if settings.fill_missing()
            && let Err(e) = self.db.set(PATH, &settings).await
        {
            warn!(error = %e, "Could not backfill site settings");
        }
        Ok(settings)
    }

    /// Merge new settings into the stored record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    #[instrument(skip(self, settings))]
    pub async fn update(&self, settings: &SiteSettings) -> Result<(), RepositoryError> {
        self.db.update(PATH, settings).await?;
        if let Some(cache) = &self.cache {
            cache.invalidate_settings().await;
        }
        Ok(())
    }

    /// Overwrite the stored record with defaults.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<SiteSettings, RepositoryError> {
        let defaults = SiteSettings::default();
        self.db.set(PATH, &defaults).await?;
        if let Some(cache) = &self.cache {
            cache.invalidate_settings().await;
        }
        Ok(defaults)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use innovacart_core::PaymentMethod;
    use serde_json::json;

    #[tokio::test]
    async fn test_absent_settings_are_created() {
        let db = RealtimeDatabase::memory();
        let repo = SettingsRepository::new(db.clone(), None);
        let settings = repo.get().await;
        assert_eq!(settings, SiteSettings::default());
        assert!(db.get::<SiteSettings>(PATH).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_sections_are_backfilled() {
        let db = RealtimeDatabase::memory();
        db.set(
            PATH,
            &json!({"itSolutionsAvailable": false, "tshirtPageAvailable": true}),
        )
        .await
        .unwrap();

        let repo = SettingsRepository::new(db.clone(), None);
        let settings = repo.get().await;
        assert!(!settings.it_solutions_available);
        assert!(settings.feature_icons.is_some());

        let stored = db.get_value("settings/featureIcons/delivery").await.unwrap();
        assert_eq!(stored, json!("truck"));
    }

    #[tokio::test]
    async fn test_update_invalidates_cache() {
        let db = RealtimeDatabase::memory();
        let cache = CatalogCache::new(std::time::Duration::from_secs(60));
        let repo = SettingsRepository::new(db, Some(cache));

        let mut settings = repo.get().await;
        settings.tshirt_page_available = false;
        if let Some(numbers) = settings.payment_numbers.as_mut() {
            numbers.nagad = "01800000000".to_string();
        }
        repo.update(&settings).await.unwrap();

        let fresh = repo.get().await;
        assert!(!fresh.tshirt_page_available);
        assert_eq!(fresh.payment_number(PaymentMethod::Nagad), "01800000000");
    }
}
