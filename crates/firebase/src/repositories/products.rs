//! Products at `products/{id}`.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use innovacart_core::ProductId;
use innovacart_core::catalog::{Product, filter_by_category};

use super::cache::{CacheKey, CacheValue, CatalogCache};
use super::now_millis;
use crate::database::RealtimeDatabase;
use crate::error::RepositoryError;
use crate::push_id::push_id;

const PATH: &str = "products";

fn product_path(id: &ProductId) -> String {
    format!("{PATH}/{id}")
}

#[derive(Debug, Clone)]
pub struct ProductRepository {
    db: RealtimeDatabase,
    cache: Option<CatalogCache>,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(db: RealtimeDatabase, cache: Option<CatalogCache>) -> Self {
        Self { db, cache }
    }

    /// Store a new product. Variants are normalised and the key and creation
    /// time are assigned here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Product` if validation fails, or
    /// `RepositoryError::Database` if the write fails.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn add(&self, mut product: Product) -> Result<Product, RepositoryError> {
        product.normalize_variants();
        product.validate()?;
        product.id = ProductId::new(push_id());
        product.created_at = now_millis();

        self.db.set(&product_path(&product.id), &product).await?;
        self.invalidate(&product.id).await;
        info!(product_id = %product.id, "Product added");
        Ok(product)
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        if let Some(cache) = &self.cache
            && let Some(CacheValue::Products(products)) = cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for product list");
            return Ok(products.as_ref().clone());
        }

        let mut products: Vec<Product> = self
            .db
            .list::<Product>(PATH)
            .await?
            .into_iter()
            .map(|(key, mut product)| {
                if product.id.is_empty() {
                    product.id = ProductId::new(key);
                }
                product
            })
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if let Some(cache) = &self.cache {
            cache
                .insert(CacheKey::Products, CacheValue::Products(Arc::new(products.clone())))
                .await;
        }
        Ok(products)
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let key = CacheKey::Product(id.clone());
        if let Some(cache) = &self.cache
            && let Some(CacheValue::Product(product)) = cache.get(&key).await
        {
            return Ok(Some(*product));
        }

        let product = self.load(id).await?;
        if let (Some(cache), Some(found)) = (&self.cache, &product) {
            cache
                .insert(key, CacheValue::Product(Box::new(found.clone())))
                .await;
        }
        Ok(product)
    }

    /// A product read straight from the database, for stock checks.
    /// The cached copy is dropped so later reads see the same data.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_fresh(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        self.invalidate(id).await;
        self.load(id).await
    }

    async fn load(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self
            .db
            .get::<Product>(&product_path(id))
            .await?
            .map(|mut p| {
                if p.id.is_empty() {
                    p.id = id.clone();
                }
                p
            }))
    }

    /// A product that must exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when absent.
    pub async fn require(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        self.get(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("product {id}")))
    }

    /// Products in a category, matching category aliases.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    pub async fn by_category(&self, category: &str) -> Result<Vec<Product>, RepositoryError> {
        let products = self.list().await?;
        Ok(filter_by_category(&products, category))
    }

    /// Replace a product's fields. The key and creation time are preserved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist,
    /// `RepositoryError::Product` if validation fails.
    #[instrument(skip(self, product), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: &ProductId,
        mut product: Product,
    ) -> Result<Product, RepositoryError> {
        let existing = self
            .db
            .get::<Product>(&product_path(id))
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("product {id}")))?;

        product.normalize_variants();
        product.validate()?;
        product.id = id.clone();
        product.created_at = existing.created_at;

        self.db.update(&product_path(id), &product).await?;
        self.invalidate(id).await;
        info!("Product updated");
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        self.db.remove(&product_path(id)).await?;
        self.invalidate(id).await;
        info!("Product deleted");
        Ok(())
    }

    async fn invalidate(&self, id: &ProductId) {
        if let Some(cache) = &self.cache {
            cache.invalidate_product(id).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::Utc;
    use innovacart_core::VariantId;
    use innovacart_core::catalog::{ProductError, ProductVariant};
    use rust_decimal::Decimal;

    fn draft(name: &str, category: &str) -> Product {
        Product {
            id: ProductId::default(),
            name: name.to_string(),
            description: String::new(),
            price: Decimal::from(250),
            category: category.to_string(),
            image: String::new(),
            stock: 5,
            has_variants: false,
            variants: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_add_assigns_key_and_normalises() {
        let repo = ProductRepository::new(RealtimeDatabase::memory(), None);
        let mut shirt = draft("Tee", "t-shirts");
        shirt.has_variants = true;
        for (id, stock) in [("s", 2), ("m", 3)] {
            shirt.variants.push(ProductVariant {
                id: VariantId::new(id),
                name: id.to_uppercase(),
                price: None,
                stock,
                default: false,
            });
        }

        let saved = repo.add(shirt).await.unwrap();
        assert_eq!(saved.id.as_str().len(), crate::push_id::PUSH_ID_LEN);
        assert_eq!(saved.stock, 5);
        assert!(saved.variants[0].default);

        let loaded = repo.get(&saved.id).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn test_add_rejects_invalid() {
        let repo = ProductRepository::new(RealtimeDatabase::memory(), None);
        let err = repo.add(draft("  ", "fruits")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Product(ProductError::MissingName)));
    }

    #[tokio::test]
    async fn test_by_category_and_delete() {
        let cache = CatalogCache::new(std::time::Duration::from_secs(60));
        let repo = ProductRepository::new(RealtimeDatabase::memory(), Some(cache));
        let mango = repo.add(draft("Mango", "fruit")).await.unwrap();
        repo.add(draft("Tee", "tshirt")).await.unwrap();

        let fruits = repo.by_category("fruits").await.unwrap();
        assert_eq!(fruits.len(), 1);
        assert_eq!(fruits[0].name, "Mango");

        repo.delete(&mango.id).await.unwrap();
        assert!(repo.by_category("fruits").await.unwrap().is_empty());
        assert!(repo.get(&mango.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_fresh_skips_stale_cache() {
        let db = RealtimeDatabase::memory();
        let cache = CatalogCache::new(std::time::Duration::from_secs(60));
        let repo = ProductRepository::new(db.clone(), Some(cache));
        let mango = repo.add(draft("Mango", "fruits")).await.unwrap();
        assert_eq!(repo.get(&mango.id).await.unwrap().unwrap().stock, 5);

        // Another process sells out the product.
        db.update(&product_path(&mango.id), &serde_json::json!({"stock": 0}))
            .await
            .unwrap();
        assert_eq!(repo.get(&mango.id).await.unwrap().unwrap().stock, 5);
        assert_eq!(repo.get_fresh(&mango.id).await.unwrap().unwrap().stock, 0);
        assert_eq!(repo.get(&mango.id).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_update_preserves_identity() {
        let repo = ProductRepository::new(RealtimeDatabase::memory(), None);
        let saved = repo.add(draft("Mango", "fruits")).await.unwrap();

        let mut edited = draft("Himsagar Mango", "fruits");
        edited.price = Decimal::from(300);
        let updated = repo.update(&saved.id, edited).await.unwrap();
        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.created_at.timestamp_millis(), saved.created_at.timestamp_millis());

        let missing = repo.update(&ProductId::new("nope"), draft("X", "fruits")).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound(_))));
    }
}
