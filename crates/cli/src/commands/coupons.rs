//! Coupon commands.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use innovacart_core::DiscountType;
use innovacart_core::coupon::{Coupon, expiry_from_date, generate_code};
use innovacart_firebase::Repositories;

use super::CliError;

/// Arguments of `coupons create`.
#[derive(Debug, Clone)]
pub struct CreateCoupon {
    pub code: Option<String>,
    pub discount: Decimal,
    pub discount_type: DiscountType,
    pub max_usage: u32,
    pub expires: NaiveDate,
}

/// Create a coupon, generating a code when none is given.
///
/// # Errors
///
/// Returns `CliError::Invalid` for an expiry in the past and
/// `CliError::Repository` for invalid fields or a duplicate code.
pub async fn create(repos: &Repositories, request: CreateCoupon) -> Result<Coupon, CliError> {
    let expiry = expiry_from_date(request.expires);
    if expiry < Utc::now() {
        return Err(CliError::Invalid(format!(
            "expiry date {} is in the past",
            request.expires
        )));
    }

    let code = request
        .code
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| generate_code(&mut rand::rng()));
    let coupon = Coupon::new(
        &code,
        request.discount,
        request.discount_type,
        request.max_usage,
        expiry,
    );

    let saved = repos.coupons.add(coupon).await?;
    tracing::info!(
        "Coupon {} created: {}, {} uses, expires {}",
        saved.code,
        saved.describe(),
        saved.max_usage,
        saved.expiry_date.format("%Y-%m-%d")
    );
    Ok(saved)
}

/// Print every coupon with its current status.
///
/// # Errors
///
/// Returns `CliError::Repository` if the read fails.
pub async fn list(repos: &Repositories) -> Result<(), CliError> {
    let now = Utc::now();
    let coupons = repos.coupons.list().await?;
    if coupons.is_empty() {
        tracing::info!("No coupons");
    }
    for coupon in coupons {
        tracing::info!(
            "{:<12} {:<14} {:>4}/{:<4} expires {}  [{}]",
            coupon.code,
            coupon.describe(),
            coupon.used_count,
            coupon.max_usage,
            coupon.expiry_date.format("%Y-%m-%d"),
            coupon.status(now).label()
        );
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Days, Utc};
    use innovacart_core::coupon::CODE_LENGTH;
    use innovacart_firebase::{RealtimeDatabase, RepositoryError};

    fn request(code: Option<&str>, expires: NaiveDate) -> CreateCoupon {
        CreateCoupon {
            code: code.map(String::from),
            discount: Decimal::from(15),
            discount_type: DiscountType::Percentage,
            max_usage: 20,
            expires,
        }
    }

    fn next_month() -> NaiveDate {
        Utc::now().date_naive().checked_add_days(Days::new(30)).unwrap()
    }

    #[tokio::test]
    async fn test_create_generates_code() {
        let repos = Repositories::new(RealtimeDatabase::memory());
        let saved = create(&repos, request(None, next_month())).await.unwrap();
        assert_eq!(saved.code.len(), CODE_LENGTH);
        assert_eq!(saved.max_usage, 20);
        list(&repos).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_and_past_expiry() {
        let repos = Repositories::new(RealtimeDatabase::memory());
        create(&repos, request(Some("eid"), next_month())).await.unwrap();

        let err = create(&repos, request(Some("EID"), next_month())).await.unwrap_err();
        assert!(matches!(
            err,
            CliError::Repository(RepositoryError::Conflict(_))
        ));

        let yesterday = Utc::now().date_naive().checked_sub_days(Days::new(1)).unwrap();
        let err = create(&repos, request(Some("LATE"), yesterday)).await.unwrap_err();
        assert!(matches!(err, CliError::Invalid(_)));
    }
}
