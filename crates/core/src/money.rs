//! Minor-unit money arithmetic.
//!
//! Shared helpers for discount calculations. All amounts are `u64` minor
//! units; percentage math goes through [`rust_decimal::Decimal`] and is
//! rounded half-up in a single step so repeated calculations cannot
//! accumulate rounding drift.

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso};
use thiserror::Error;

/// Errors specific to minor-unit money arithmetic.
#[derive(Debug, Error)]
pub enum MoneyMathError {
    /// The percentage calculation overflowed or could not be represented.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// A line or subtotal calculation overflowed `u64` minor units.
    #[error("amount arithmetic overflowed")]
    AmountOverflow,
}

/// Calculate `percentage`% of an amount in minor units.
///
/// The result is rounded half-up (midpoint away from zero) to whole minor
/// units. This is the single rounding step in the pricing pipeline.
///
/// # Errors
///
/// Returns [`MoneyMathError::PercentConversion`] when the amount cannot be
/// represented as a `Decimal`, the multiplication overflows, or the rounded
/// result does not fit back into `u64`.
pub fn percent_of_minor(percentage: Decimal, minor: u64) -> Result<u64, MoneyMathError> {
    let minor = Decimal::from_u64(minor).ok_or(MoneyMathError::PercentConversion)?;

    percentage
        .checked_div(Decimal::ONE_HUNDRED)
        .ok_or(MoneyMathError::PercentConversion)?
        .checked_mul(minor)
        .ok_or(MoneyMathError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(MoneyMathError::PercentConversion)
}

/// Sum a line's minor-unit price across its quantity.
///
/// # Errors
///
/// Returns [`MoneyMathError::AmountOverflow`] when the multiplication
/// overflows `u64`.
pub fn line_total(unit_price: u64, quantity: u32) -> Result<u64, MoneyMathError> {
    unit_price
        .checked_mul(u64::from(quantity))
        .ok_or(MoneyMathError::AmountOverflow)
}

/// Format a minor-unit amount using ISO currency metadata, e.g.
/// `format_minor(2_000, "USD")` -> `Some("$20.00")`.
///
/// Returns `None` for unknown currency codes or amounts beyond `i64`.
pub fn format_minor(minor: u64, code: &str) -> Option<String> {
    let currency = iso::find(code)?;
    let minor = i64::try_from(minor).ok()?;

    Some(Money::from_minor(minor, currency).to_string())
}
