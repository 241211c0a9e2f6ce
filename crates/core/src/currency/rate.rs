//! Reverse exchange rates and the rate table consumed by aggregation.
//!
//! Rates are quoted as "units of the foreign currency per 1 unit of base".
//! Converting a foreign amount to base is therefore a division. Keeping the
//! quote in a dedicated type means a per-unit rate cannot be passed where a
//! reverse rate is expected without going through [`ReverseRate::from_per_unit`].

use std::collections::BTreeMap;

use dashbank_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building rates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    /// Rate must be strictly positive.
    #[error("Exchange rate for {currency} must be positive, got {rate}")]
    NonPositive {
        /// Currency the rate was quoted for.
        currency: String,
        /// Offending value.
        rate: Decimal,
    },

    /// Inverting the rate overflowed decimal precision.
    #[error("Exchange rate for {0} cannot be inverted")]
    NotInvertible(String),
}

/// Units of a foreign currency equivalent to one unit of base currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct ReverseRate(Decimal);

impl ReverseRate {
    /// Creates a reverse rate from a "foreign units per base unit" quote.
    ///
    /// # Errors
    ///
    /// Returns `RateError::NonPositive` for zero or negative quotes.
    pub fn new(units_per_base: Decimal) -> Result<Self, RateError> {
        if units_per_base <= Decimal::ZERO {
            return Err(RateError::NonPositive {
                currency: String::new(),
                rate: units_per_base,
            });
        }
        Ok(Self(units_per_base))
    }

    /// Creates a reverse rate from a per-unit quote ("base units per 1 foreign unit").
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive quotes or quotes too small to invert.
    pub fn from_per_unit(base_per_unit: Decimal) -> Result<Self, RateError> {
        if base_per_unit <= Decimal::ZERO {
            return Err(RateError::NonPositive {
                currency: String::new(),
                rate: base_per_unit,
            });
        }
        Decimal::ONE
            .checked_div(base_per_unit)
            .map(Self)
            .ok_or_else(|| RateError::NotInvertible(base_per_unit.to_string()))
    }

    /// Returns the quote as a decimal.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Converts a foreign amount into base currency (`amount / rate`).
    ///
    /// Returns `None` only if the division overflows.
    #[must_use]
    pub fn to_base(self, amount: Decimal) -> Option<Decimal> {
        amount.checked_div(self.0)
    }
}

impl TryFrom<Decimal> for ReverseRate {
    type Error = RateError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ReverseRate> for Decimal {
    fn from(rate: ReverseRate) -> Self {
        rate.0
    }
}

/// Mapping from currency code to its reverse rate against the base currency.
///
/// The base currency is implicitly convertible at rate 1 and is never stored.
/// A code missing from the table is unconvertible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRateTable {
    base: CurrencyCode,
    rates: BTreeMap<CurrencyCode, ReverseRate>,
}

impl ExchangeRateTable {
    /// Creates an empty table for the given base currency.
    #[must_use]
    pub fn new(base: CurrencyCode) -> Self {
        Self {
            base,
            rates: BTreeMap::new(),
        }
    }

    /// Creates an empty table for BGN.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(CurrencyCode::base())
    }

    /// Builds a table from raw reverse quotes.
    ///
    /// # Errors
    ///
    /// Returns the first `RateError` encountered; the table is not partially built.
    pub fn from_reverse_rates(
        base: CurrencyCode,
        quotes: impl IntoIterator<Item = (CurrencyCode, Decimal)>,
    ) -> Result<Self, RateError> {
        let mut table = Self::new(base);
        for (code, quote) in quotes {
            let rate = ReverseRate::new(quote).map_err(|err| match err {
                RateError::NonPositive { rate, .. } => RateError::NonPositive {
                    currency: code.to_string(),
                    rate,
                },
                other => other,
            })?;
            table.insert(code, rate);
        }
        Ok(table)
    }

    /// Adds or replaces a rate. Rates for the base currency are ignored.
    pub fn insert(&mut self, code: CurrencyCode, rate: ReverseRate) {
        if code != self.base {
            self.rates.insert(code, rate);
        }
    }

    /// Returns the base currency.
    #[must_use]
    pub const fn base(&self) -> &CurrencyCode {
        &self.base
    }

    /// Looks up the reverse rate for a non-base currency.
    #[must_use]
    pub fn get(&self, code: &CurrencyCode) -> Option<ReverseRate> {
        self.rates.get(code).copied()
    }

    /// Returns true if amounts in `code` can be expressed in base currency.
    #[must_use]
    pub fn is_convertible(&self, code: &CurrencyCode) -> bool {
        *code == self.base || self.rates.contains_key(code)
    }

    /// Number of non-base rates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns true if no foreign rate is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Iterates rates in currency-code order.
    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, &ReverseRate)> {
        self.rates.iter()
    }
}

impl Default for ExchangeRateTable {
    fn default() -> Self {
        Self::empty()
    }
}
