//! Money handling using decimal arithmetic.
//!
//! The shop trades in Bangladeshi taka only, so amounts are plain
//! [`Decimal`] values rather than amount/currency pairs. The document
//! database stores them as JSON numbers; use the `serde` helpers in
//! [`rust_decimal::serde::float`] on fields that cross that boundary.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Currency symbol for taka.
pub const TAKA: &str = "৳";

/// Errors from parsing a money amount typed into a form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Input was blank.
    #[error("amount is required")]
    Empty,
    /// Input was not a number.
    #[error("'{0}' is not a valid amount")]
    Invalid(String),
    /// Amount was below zero.
    #[error("amount cannot be negative")]
    Negative,
}

/// Round to two decimal places, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount for display, e.g. `৳1250.00`.
#[must_use]
pub fn format_taka(amount: Decimal) -> String {
    format!("{TAKA}{:.2}", round_money(amount))
}

/// Parse a non-negative amount from form input.
///
/// # Errors
///
/// Returns `PriceError` if the input is blank, not numeric, or negative.
pub fn parse_amount(input: &str) -> Result<Decimal, PriceError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PriceError::Empty);
    }
    let amount =
        Decimal::from_str(trimmed).map_err(|_| PriceError::Invalid(trimmed.to_string()))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(PriceError::Negative);
    }
    Ok(amount)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_format_taka() {
        assert_eq!(format_taka(d("60")), "৳60.00");
        assert_eq!(format_taka(d("12.345")), "৳12.35");
        assert_eq!(format_taka(Decimal::ZERO), "৳0.00");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 120.5 ").unwrap(), d("120.5"));
        assert_eq!(parse_amount(""), Err(PriceError::Empty));
        assert!(matches!(parse_amount("abc"), Err(PriceError::Invalid(_))));
        assert_eq!(parse_amount("-3"), Err(PriceError::Negative));
    }
}
