//! Currency conversion logic.
//!
//! CRITICAL: Rounding strategy for aggregated totals:
//! - Convert and sum at full precision
//! - Round only at the presentation boundary, to 2 decimal places
//! - Use banker's rounding (round half to even)

use dashbank_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

use super::rate::ExchangeRateTable;

/// Fraction digits shown for every total.
pub const DISPLAY_DECIMAL_PLACES: u32 = 2;

/// Why an amount could not be expressed in base currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionError {
    /// The currency is neither base nor in the table.
    NoRate,
    /// The rate exists but the quotient does not fit a `Decimal`.
    Overflow,
}

/// Converts an amount into the table's base currency.
///
/// Base-currency amounts pass through unchanged. Foreign amounts are divided
/// by their reverse rate.
///
/// # Errors
///
/// Returns `ConversionError::NoRate` when the currency is not in the table
/// and `ConversionError::Overflow` when the division overflows.
pub fn try_convert_to_base(
    amount: Decimal,
    currency: &CurrencyCode,
    table: &ExchangeRateTable,
) -> Result<Decimal, ConversionError> {
    if currency == table.base() {
        return Ok(amount);
    }
    let rate = table.get(currency).ok_or(ConversionError::NoRate)?;
    rate.to_base(amount).ok_or(ConversionError::Overflow)
}

/// Like [`try_convert_to_base`], discarding the reason.
///
/// Callers exclude unconvertible amounts instead of treating them as zero.
#[must_use]
pub fn convert_to_base(
    amount: Decimal,
    currency: &CurrencyCode,
    table: &ExchangeRateTable,
) -> Option<Decimal> {
    try_convert_to_base(amount, currency, table).ok()
}

/// Rounds a value for display using banker's rounding.
#[must_use]
pub fn round_for_display(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DISPLAY_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven)
}
