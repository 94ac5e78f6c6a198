//! Product reviews stored under `reviews/{productId}/{id}`.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, ReviewId, UserId};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("Please write a comment for your review")]
    EmptyComment,
    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
    pub rating: u8,
    pub comment: String,
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Validate and build a review. The display name falls back to the email's
    /// local part, then to "Anonymous".
    ///
    /// # Errors
    ///
    /// Returns `ReviewError` for an empty comment or a rating outside 1..=5.
    pub fn new(
        product_id: ProductId,
        user_id: UserId,
        display_name: Option<&str>,
        email: &str,
        rating: u8,
        comment: &str,
    ) -> Result<Self, ReviewError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ReviewError::RatingOutOfRange);
        }
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ReviewError::EmptyComment);
        }

        let user_name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or_else(|| email.split('@').next().filter(|l| !l.is_empty()))
            .unwrap_or("Anonymous")
            .to_string();

        Ok(Self {
            id: ReviewId::default(),
            product_id,
            user_id,
            user_name,
            user_email: email.to_string(),
            rating,
            comment: comment.to_string(),
            created_at: Utc::now(),
        })
    }
}

/// Aggregate rating of a product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rating {
    /// Mean rating rounded to one decimal place.
    pub average: Decimal,
    pub count: usize,
}

impl Rating {
    #[must_use]
    pub fn from_reviews(reviews: &[Review]) -> Self {
        if reviews.is_empty() {
            return Self::default();
        }
        let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
        let average = (Decimal::from(sum) / Decimal::from(reviews.len()))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        Self {
            average,
            count: reviews.len(),
        }
    }

    /// Number of whole stars to fill (average rounded half up).
    #[must_use]
    pub fn filled_stars(&self) -> u8 {
        let rounded = self
            .average
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        rounded.to_u8().unwrap_or(0).min(MAX_RATING)
    }
}

/// Sort reviews newest first.
pub fn sort_newest_first(reviews: &mut [Review]) {
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review::new(
            ProductId::new("p1"),
            UserId::new("u1"),
            None,
            "karim@example.com",
            rating,
            "Great",
        )
        .unwrap()
    }

    #[test]
    fn test_rating_average_rounds_to_one_decimal() {
        let rating = Rating::from_reviews(&[review(5), review(4), review(4)]);
        assert_eq!(rating.average, "4.3".parse::<Decimal>().unwrap());
        assert_eq!(rating.count, 3);
        assert_eq!(rating.filled_stars(), 4);
    }

    #[test]
    fn test_empty_rating() {
        let rating = Rating::from_reviews(&[]);
        assert_eq!(rating.count, 0);
        assert!(rating.average.is_zero());
        assert_eq!(rating.filled_stars(), 0);
    }

    #[test]
    fn test_name_fallbacks() {
        assert_eq!(review(5).user_name, "karim");
        let named = Review::new(
            ProductId::new("p1"),
            UserId::new("u1"),
            Some("Karim R"),
            "karim@example.com",
            5,
            "ok",
        )
        .unwrap();
        assert_eq!(named.user_name, "Karim R");
        let anon =
            Review::new(ProductId::new("p1"), UserId::new("u1"), Some(" "), "", 3, "ok").unwrap();
        assert_eq!(anon.user_name, "Anonymous");
    }

    #[test]
    fn test_validation() {
        let err = Review::new(ProductId::new("p"), UserId::new("u"), None, "", 0, "x");
        assert_eq!(err, Err(ReviewError::RatingOutOfRange));
        let err = Review::new(ProductId::new("p"), UserId::new("u"), None, "", 5, "   ");
        assert_eq!(err, Err(ReviewError::EmptyComment));
    }
}
