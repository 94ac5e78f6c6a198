//! Product reviews at `reviews/{productId}/{id}`.

use tracing::{info, instrument};

use innovacart_core::review::{Rating, Review, sort_newest_first};
use innovacart_core::{ProductId, ReviewId};

use super::now_millis;
use crate::database::RealtimeDatabase;
use crate::error::RepositoryError;
use crate::push_id::push_id;

const PATH: &str = "reviews";

fn product_reviews_path(product_id: &ProductId) -> String {
    format!("{PATH}/{product_id}")
}

#[derive(Debug, Clone)]
pub struct ReviewRepository {
    db: RealtimeDatabase,
}

impl ReviewRepository {
    #[must_use]
    pub const fn new(db: RealtimeDatabase) -> Self {
        Self { db }
    }

    /// Store a review under its product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    #[instrument(skip(self, review), fields(product_id = %review.product_id, rating = review.rating))]
    pub async fn add(&self, mut review: Review) -> Result<Review, RepositoryError> {
        review.id = ReviewId::new(push_id());
        review.created_at = now_millis();

        let path = format!("{}/{}", product_reviews_path(&review.product_id), review.id);
        self.db.set(&path, &review).await?;
        info!(review_id = %review.id, "Review added");
        Ok(review)
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn list_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let mut reviews: Vec<Review> = self
            .db
            .list::<Review>(&product_reviews_path(product_id))
            .await?
            .into_iter()
            .map(|(key, mut review)| {
                if review.id.is_empty() {
                    review.id = ReviewId::new(key);
                }
                if review.product_id.is_empty() {
                    review.product_id = product_id.clone();
                }
                review
            })
            .collect();
        sort_newest_first(&mut reviews);
        Ok(reviews)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    pub async fn rating(&self, product_id: &ProductId) -> Result<Rating, RepositoryError> {
        let reviews = self.list_for_product(product_id).await?;
        Ok(Rating::from_reviews(&reviews))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self), fields(product_id = %product_id, review_id = %review_id))]
    pub async fn delete(
        &self,
        product_id: &ProductId,
        review_id: &ReviewId,
    ) -> Result<(), RepositoryError> {
        let path = format!("{}/{review_id}", product_reviews_path(product_id));
        self.db.remove(&path).await?;
        info!("Review deleted");
        Ok(())
    }
}
