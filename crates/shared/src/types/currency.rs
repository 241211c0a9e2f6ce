//! Currency codes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Code of the currency all dashboard totals are expressed in.
pub const BASE_CURRENCY: &str = "BGN";

/// Currency code (e.g. "BGN", "EUR").
///
/// The set is open: the rate table decides which codes are convertible.
/// Codes are normalised to upper case on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses a currency code, trimming and upper-casing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty or contains non-alphabetic characters.
    pub fn parse(code: &str) -> Result<Self, String> {
        let trimmed = code.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(format!("Invalid currency code: {code}"));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// The base currency (BGN).
    #[must_use]
    pub fn base() -> Self {
        Self(BASE_CURRENCY.to_string())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}
