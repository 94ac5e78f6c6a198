//! Read cache shared by the catalog and settings repositories.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use innovacart_core::ProductId;
use innovacart_core::catalog::Product;
use innovacart_core::settings::SiteSettings;

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Settings,
    Products,
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Settings(Box<SiteSettings>),
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
}

/// Short-lived cache of storefront reads. Writes through the owning
/// repositories invalidate the affected keys.
#[derive(Clone)]
pub struct CatalogCache {
    inner: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().max_capacity(1000).time_to_live(ttl).build(),
        }
    }

    pub(crate) async fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        self.inner.get(key).await
    }

    pub(crate) async fn insert(&self, key: CacheKey, value: CacheValue) {
        self.inner.insert(key, value).await;
    }

    pub(crate) async fn invalidate_settings(&self) {
        self.inner.invalidate(&CacheKey::Settings).await;
    }

    pub(crate) async fn invalidate_product(&self, id: &ProductId) {
        self.inner.invalidate(&CacheKey::Products).await;
        self.inner.invalidate(&CacheKey::Product(id.clone())).await;
    }
}
