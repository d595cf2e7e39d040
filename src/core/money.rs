//! Money helpers using `rust_decimal` for precision.
//!
//! Amounts are stored as `f64` columns. Every calculation converts to
//! [`Decimal`], works there, rounds half away from zero to two places and
//! only then converts back for storage or serialization.

use crate::errors::{Error, Result};
use rust_decimal::prelude::*;

/// Decimal places kept for currency values
const DECIMAL_PLACES: u32 = 2;

/// Largest single amount accepted from callers
const MAX_AMOUNT: f64 = 100_000_000.0;

/// Converts a stored amount to `Decimal`. Non-finite values become zero.
#[must_use]
pub fn dec(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Rounds to currency precision.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to currency precision and converts for storage.
#[must_use]
pub fn to_amount(value: Decimal) -> f64 {
    round_money(value).to_f64().unwrap_or_default()
}

/// Sums stored amounts exactly and returns the rounded total.
pub fn sum_amounts<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = f64>,
{
    round_money(values.into_iter().map(dec).sum())
}

/// Line total for `quantity` units at `unit_price`.
#[must_use]
pub fn line_total(unit_price: f64, quantity: i32) -> Decimal {
    dec(unit_price) * Decimal::from(quantity)
}

/// Applies a percentage rate: `amount * rate / 100`.
#[must_use]
pub fn percent_of(amount: Decimal, rate: f64) -> Decimal {
    amount * dec(rate) / Decimal::ONE_HUNDRED
}

/// Accepts a finite, non-negative amount within bounds.
pub fn require_non_negative(amount: f64) -> Result<Decimal> {
    if !amount.is_finite() || !(0.0..=MAX_AMOUNT).contains(&amount) {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(dec(amount))
}

/// Accepts a finite, strictly positive amount within bounds.
pub fn require_positive(amount: f64) -> Result<Decimal> {
    let value = require_non_negative(amount)?;
    if value.is_zero() {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(value)
}
