//! Coupons at `coupons/{id}`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, instrument, warn};

use innovacart_core::CouponId;
use innovacart_core::coupon::{Coupon, normalize_code, validate_code};

use super::now_millis;
use crate::database::RealtimeDatabase;
use crate::error::RepositoryError;
use crate::push_id::push_id;

const PATH: &str = "coupons";

fn coupon_path(id: &CouponId) -> String {
    format!("{PATH}/{id}")
}

#[derive(Debug, Clone)]
pub struct CouponRepository {
    db: RealtimeDatabase,
}

impl CouponRepository {
    #[must_use]
    pub const fn new(db: RealtimeDatabase) -> Self {
        Self { db }
    }

    /// Store a new coupon. Codes are unique ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Coupon` if a field is invalid, or
    /// `RepositoryError::Conflict` if the code is taken.
    #[instrument(skip(self, coupon), fields(code = %coupon.code))]
    pub async fn add(&self, mut coupon: Coupon) -> Result<Coupon, RepositoryError> {
        coupon.code = normalize_code(&coupon.code);
        coupon.validate()?;
        if self.find_by_code(&coupon.code).await?.is_some() {
            return Err(RepositoryError::Conflict(format!(
                "coupon code {} already exists",
                coupon.code
            )));
        }

        coupon.id = CouponId::new(push_id());
        coupon.used_count = 0;
        coupon.last_used = None;
        coupon.created_at = now_millis();

        self.db.set(&coupon_path(&coupon.id), &coupon).await?;
        info!(coupon_id = %coupon.id, "Coupon created");
        Ok(coupon)
    }

    /// All coupons, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let mut coupons: Vec<Coupon> = self
            .db
            .list::<Coupon>(PATH)
            .await?
            .into_iter()
            .map(|(key, mut coupon)| {
                if coupon.id.is_empty() {
                    coupon.id = CouponId::new(key);
                }
                coupon
            })
            .collect();
        coupons.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(coupons)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    pub async fn get(&self, id: &CouponId) -> Result<Option<Coupon>, RepositoryError> {
        Ok(self.db.get::<Coupon>(&coupon_path(id)).await?.map(|mut c| {
            if c.id.is_empty() {
                c.id = id.clone();
            }
            c
        }))
    }

    /// Look a coupon up by code, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|c| c.matches_code(code)))
    }

    /// Validate `code` against `subtotal` and return the coupon with its
    /// discount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Coupon` with the user-facing reason.
    #[instrument(skip(self), fields(code = %code.trim()))]
    pub async fn apply(
        &self,
        code: &str,
        subtotal: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(Coupon, Decimal), RepositoryError> {
        let coupons = self.list().await?;
        let (coupon, discount) = validate_code(&coupons, code, subtotal, now)?;
        Ok((coupon.clone(), discount))
    }

    /// Record one use of a coupon.
    ///
    /// This is a read followed by a write; two simultaneous redemptions can
    /// count once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no coupon has the code.
    #[instrument(skip(self))]
    pub async fn redeem(&self, code: &str) -> Result<Coupon, RepositoryError> {
        let mut coupon = self
            .find_by_code(code)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("coupon {}", normalize_code(code))))?;

        coupon.used_count = coupon.used_count.saturating_add(1);
        let used_at = now_millis();
        coupon.last_used = Some(used_at);
        self.db
            .update(
                &coupon_path(&coupon.id),
                &json!({
                    "usedCount": coupon.used_count,
                    "lastUsed": used_at.timestamp_millis(),
                }),
            )
            .await?;

        if coupon.used_count > coupon.max_usage {
            warn!(coupon_id = %coupon.id, used = coupon.used_count, max = coupon.max_usage, "Coupon redeemed past its limit");
        }
        info!(coupon_id = %coupon.id, used = coupon.used_count, "Coupon redeemed");
        Ok(coupon)
    }

    /// Enable or disable a coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon does not exist.
    #[instrument(skip(self), fields(coupon_id = %id))]
    pub async fn set_active(&self, id: &CouponId, active: bool) -> Result<(), RepositoryError> {
        if self.get(id).await?.is_none() {
            return Err(RepositoryError::NotFound(format!("coupon {id}")));
        }
        self.db
            .update(&coupon_path(id), &json!({ "isActive": active }))
            .await?;
        info!(active, "Coupon toggled");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self), fields(coupon_id = %id))]
    pub async fn delete(&self, id: &CouponId) -> Result<(), RepositoryError> {
        self.db.remove(&coupon_path(id)).await?;
        info!("Coupon deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use innovacart_core::DiscountType;
    use innovacart_core::coupon::CouponError;

    fn coupon(code: &str, max_usage: u32) -> Coupon {
        Coupon::new(
            code,
            Decimal::from(10),
            DiscountType::Percentage,
            max_usage,
            Utc::now() + Duration::days(7),
        )
    }

    #[tokio::test]
    async fn test_add_rejects_duplicate_code() {
        let repo = CouponRepository::new(RealtimeDatabase::memory());
        let saved = repo.add(coupon(" eid10 ", 5)).await.unwrap();
        assert_eq!(saved.code, "EID10");

        let err = repo.add(coupon("Eid10", 5)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_and_redeem() {
        let repo = CouponRepository::new(RealtimeDatabase::memory());
        repo.add(coupon("SAVE", 1)).await.unwrap();

        let (found, discount) = repo.apply("save", Decimal::from(500), Utc::now()).await.unwrap();
        assert_eq!(found.code, "SAVE");
        assert_eq!(discount, Decimal::from(50));

        let redeemed = repo.redeem("save").await.unwrap();
        assert_eq!(redeemed.used_count, 1);
        assert!(redeemed.last_used.is_some());

        let err = repo.apply("SAVE", Decimal::from(500), Utc::now()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Coupon(CouponError::UsedUp)));
    }

    #[tokio::test]
    async fn test_apply_unknown_and_inactive() {
        let repo = CouponRepository::new(RealtimeDatabase::memory());
        let saved = repo.add(coupon("OFF", 10)).await.unwrap();

        let err = repo.apply("NOPE", Decimal::from(100), Utc::now()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Coupon(CouponError::NotFound)));

        repo.set_active(&saved.id, false).await.unwrap();
        let err = repo.apply("OFF", Decimal::from(100), Utc::now()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Coupon(CouponError::Inactive)));

        repo.delete(&saved.id).await.unwrap();
        assert!(repo.get(&saved.id).await.unwrap().is_none());
        assert!(repo.redeem("OFF").await.is_err());
    }
}
