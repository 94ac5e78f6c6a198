//! Discount coupons.
//!
//! A coupon is validated in a fixed order before it is applied: inactive,
//! then expired, then used up. The discount never exceeds the subtotal.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CouponId, DiscountType, round_money};

/// Length of generated coupon codes.
pub const CODE_LENGTH: usize = 8;

/// Usage cap applied when the admin leaves it blank.
pub const DEFAULT_MAX_USAGE: u32 = 100;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Why a coupon cannot be applied.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponError {
    #[error("Please enter a coupon code")]
    EmptyCode,
    #[error("Coupon code not found")]
    NotFound,
    #[error("This coupon is no longer active")]
    Inactive,
    #[error("This coupon has expired")]
    Expired,
    #[error("This coupon has reached its usage limit")]
    UsedUp,
    #[error("Discount must be greater than zero")]
    InvalidDiscount,
    #[error("A percentage discount cannot exceed 100%")]
    PercentageTooHigh,
    #[error("Usage limit must be at least 1")]
    InvalidMaxUsage,
}

/// Current state of a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponStatus {
    Active,
    Inactive,
    Expired,
    UsedUp,
}

impl CouponStatus {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Expired => "Expired",
            Self::UsedUp => "Used up",
        }
    }
}

/// A discount code stored under `coupons/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(default)]
    pub id: CouponId,
    pub code: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    pub discount_type: DiscountType,
    #[serde(default = "default_max_usage")]
    pub max_usage: u32,
    #[serde(default)]
    pub used_count: u32,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub expiry_date: DateTime<Utc>,
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub last_used: Option<DateTime<Utc>>,
}

const fn default_max_usage() -> u32 {
    DEFAULT_MAX_USAGE
}

impl Coupon {
    /// Build a new, unused coupon. The code is upper-cased.
    #[must_use]
    pub fn new(
        code: &str,
        discount: Decimal,
        discount_type: DiscountType,
        max_usage: u32,
        expiry_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CouponId::default(),
            code: normalize_code(code),
            discount,
            discount_type,
            max_usage,
            used_count: 0,
            is_active: true,
            expiry_date,
            created_at: Utc::now(),
            last_used: None,
        }
    }

    /// State of the coupon at `now`, checked in validation order.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> CouponStatus {
        if !self.is_active {
            CouponStatus::Inactive
        } else if self.expiry_date < now {
            CouponStatus::Expired
        } else if self.used_count >= self.max_usage {
            CouponStatus::UsedUp
        } else {
            CouponStatus::Active
        }
    }

    /// Check the fields an admin enters.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCode`, `InvalidDiscount`, `PercentageTooHigh` or
    /// `InvalidMaxUsage`.
    pub fn validate(&self) -> Result<(), CouponError> {
        if self.code.trim().is_empty() {
            return Err(CouponError::EmptyCode);
        }
        if self.discount <= Decimal::ZERO {
            return Err(CouponError::InvalidDiscount);
        }
        if self.discount_type == DiscountType::Percentage && self.discount > Decimal::ONE_HUNDRED {
            return Err(CouponError::PercentageTooHigh);
        }
        if self.max_usage == 0 {
            return Err(CouponError::InvalidMaxUsage);
        }
        Ok(())
    }

    /// Counts toward the dashboard's "active coupons" figure.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expiry_date > now
    }

    /// Discount this coupon gives on `subtotal`.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: `Inactive`, `Expired` or `UsedUp`.
    pub fn apply(&self, subtotal: Decimal, now: DateTime<Utc>) -> Result<Decimal, CouponError> {
        match self.status(now) {
            CouponStatus::Inactive => Err(CouponError::Inactive),
            CouponStatus::Expired => Err(CouponError::Expired),
            CouponStatus::UsedUp => Err(CouponError::UsedUp),
            CouponStatus::Active => Ok(self.discount_on(subtotal)),
        }
    }

    /// Raw discount amount, capped at the subtotal.
    #[must_use]
    pub fn discount_on(&self, subtotal: Decimal) -> Decimal {
        let amount = match self.discount_type {
            DiscountType::Percentage => subtotal * self.discount / Decimal::ONE_HUNDRED,
            DiscountType::Fixed => self.discount,
        };
        round_money(amount.min(subtotal).max(Decimal::ZERO))
    }

    /// Short description such as `10% OFF` or `৳50.00 OFF`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.discount_type {
            DiscountType::Percentage => format!("{}% OFF", self.discount.normalize()),
            DiscountType::Fixed => format!("{} OFF", crate::types::format_taka(self.discount)),
        }
    }

    /// Whether `code` names this coupon (case-insensitive).
    #[must_use]
    pub fn matches_code(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code.trim())
    }
}

/// Trim and upper-case a code for storage and lookup.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Expiry instant for a calendar date: the last second of that day, UTC.
#[must_use]
pub fn expiry_from_date(date: NaiveDate) -> DateTime<Utc> {
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    date.and_time(end_of_day).and_utc()
}

/// Find a coupon by code and compute its discount.
///
/// # Errors
///
/// Returns `EmptyCode` for a blank code, `NotFound` when no coupon matches,
/// then any error from [`Coupon::apply`].
pub fn validate_code<'a>(
    coupons: &'a [Coupon],
    code: &str,
    subtotal: Decimal,
    now: DateTime<Utc>,
) -> Result<(&'a Coupon, Decimal), CouponError> {
    if code.trim().is_empty() {
        return Err(CouponError::EmptyCode);
    }
    let coupon = coupons
        .iter()
        .find(|c| c.matches_code(code))
        .ok_or(CouponError::NotFound)?;
    let discount = coupon.apply(subtotal, now)?;
    Ok((coupon, discount))
}

/// Generate a random code of [`CODE_LENGTH`] characters from `A-Z0-9`.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            char::from(CODE_ALPHABET.get(idx).copied().unwrap_or(b'A'))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn coupon(discount: &str, kind: DiscountType) -> Coupon {
        Coupon::new(
            " save10 ",
            d(discount),
            kind,
            5,
            Utc::now() + Duration::days(7),
        )
    }

    #[test]
    fn test_new_uppercases_code() {
        let c = coupon("10", DiscountType::Percentage);
        assert_eq!(c.code, "SAVE10");
        assert_eq!(c.used_count, 0);
        assert!(c.matches_code("save10"));
    }

    #[test]
    fn test_percentage_discount() {
        let c = coupon("10", DiscountType::Percentage);
        assert_eq!(c.apply(d("1250"), Utc::now()), Ok(d("125")));
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let c = coupon("500", DiscountType::Fixed);
        assert_eq!(c.apply(d("300"), Utc::now()), Ok(d("300")));
        assert_eq!(c.apply(d("800"), Utc::now()), Ok(d("500")));
    }

    #[test]
    fn test_status_order() {
        let now = Utc::now();
        let mut c = coupon("10", DiscountType::Percentage);
        c.used_count = 5;
        c.expiry_date = now - Duration::days(1);
        c.is_active = false;
        assert_eq!(c.apply(d("100"), now), Err(CouponError::Inactive));

        c.is_active = true;
        assert_eq!(c.apply(d("100"), now), Err(CouponError::Expired));

        c.expiry_date = now + Duration::days(1);
        assert_eq!(c.apply(d("100"), now), Err(CouponError::UsedUp));

        c.used_count = 4;
        assert_eq!(c.status(now), CouponStatus::Active);
    }

    #[test]
    fn test_validate_code() {
        let now = Utc::now();
        let coupons = vec![coupon("20", DiscountType::Percentage)];
        assert_eq!(
            validate_code(&coupons, "  ", d("100"), now).unwrap_err(),
            CouponError::EmptyCode
        );
        assert_eq!(
            validate_code(&coupons, "NOPE", d("100"), now).unwrap_err(),
            CouponError::NotFound
        );
        let (found, discount) = validate_code(&coupons, "Save10", d("100"), now).unwrap();
        assert_eq!(found.code, "SAVE10");
        assert_eq!(discount, d("20"));
    }

    #[test]
    fn test_validate_fields() {
        assert_eq!(coupon("10", DiscountType::Percentage).validate(), Ok(()));
        assert_eq!(
            coupon("0", DiscountType::Fixed).validate(),
            Err(CouponError::InvalidDiscount)
        );
        assert_eq!(
            coupon("150", DiscountType::Percentage).validate(),
            Err(CouponError::PercentageTooHigh)
        );
        assert_eq!(coupon("150", DiscountType::Fixed).validate(), Ok(()));

        let mut c = coupon("10", DiscountType::Fixed);
        c.max_usage = 0;
        assert_eq!(c.validate(), Err(CouponError::InvalidMaxUsage));
        c.code = "  ".to_string();
        assert_eq!(c.validate(), Err(CouponError::EmptyCode));
    }

    #[test]
    fn test_expiry_is_end_of_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let expiry = expiry_from_date(date);
        assert_eq!(expiry.to_rfc3339(), "2026-03-31T23:59:59+00:00");
    }

    #[test]
    fn test_generate_code() {
        let mut rng = rand::rng();
        for _ in 0..20 {
            let code = generate_code(&mut rng);
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
    }

    #[test]
    fn test_stored_coupon_defaults() {
        let json = r#"{"code":"FLAT50","discount":50,"discountType":"fixed","isActive":true,"expiryDate":1893456000000}"#;
        let c: Coupon = serde_json::from_str(json).unwrap();
        assert_eq!(c.max_usage, DEFAULT_MAX_USAGE);
        assert_eq!(c.used_count, 0);
        assert!(c.last_used.is_none());
        assert_eq!(c.describe(), "৳50.00 OFF");
    }
}
