//! Exchange rate adapter.
//!
//! Expects `{"rates": [{"code": "EUR", "rate": "1.95583", "reverseRate": "0.511292"}]}`
//! where `rate` is base units per unit of `code` and `reverseRate` is units of
//! `code` per base unit. Either may be a JSON string or number.

use std::time::Duration;

use async_trait::async_trait;
use dashbank_core::DashboardError;
use dashbank_core::currency::{ExchangeRateTable, ReverseRate};
use dashbank_core::ports::ExchangeRateSource;
use dashbank_shared::config::RatesConfig;
use dashbank_shared::types::CurrencyCode;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::StoreError;

/// Rate endpoint body.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesPayload {
    /// One row per currency.
    #[serde(default)]
    pub rates: Vec<RateRow>,
}

/// One currency quote.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRow {
    /// Currency code.
    pub code: String,
    /// Base units per unit of `code`.
    #[serde(default)]
    pub rate: Option<Decimal>,
    /// Units of `code` per base unit.
    #[serde(default)]
    pub reverse_rate: Option<Decimal>,
}

impl RatesPayload {
    /// Builds a rate table, preferring `reverseRate` and inverting `rate`
    /// only when the reverse value is absent.
    ///
    /// Rows with a bad code or no usable rate are skipped.
    #[must_use]
    pub fn into_table(self, base: CurrencyCode) -> ExchangeRateTable {
        let mut table = ExchangeRateTable::new(base);
        for row in self.rates {
            let code = match CurrencyCode::parse(&row.code) {
                Ok(code) => code,
                Err(err) => {
                    warn!(code = %row.code, error = %err, "Skipping rate with bad currency code");
                    continue;
                }
            };

            let rate = match (row.reverse_rate, row.rate) {
                (Some(reverse), _) => ReverseRate::new(reverse),
                (None, Some(per_unit)) => ReverseRate::from_per_unit(per_unit),
                (None, None) => {
                    warn!(currency = %code, "Skipping rate row without a value");
                    continue;
                }
            };

            match rate {
                Ok(rate) => table.insert(code, rate),
                Err(err) => warn!(currency = %code, error = %err, "Skipping unusable rate"),
            }
        }
        table
    }
}

/// Fetches the rate table over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRateSource {
    client: Client,
    url: String,
    base: CurrencyCode,
}

impl HttpRateSource {
    /// Builds a source from the `rates` config section.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Http` if the client cannot be built.
    pub fn new(config: &RatesConfig, base: CurrencyCode) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config.url.clone(), base))
    }

    /// Uses an existing client.
    #[must_use]
    pub const fn with_client(client: Client, url: String, base: CurrencyCode) -> Self {
        Self { client, url, base }
    }

    async fn fetch(&self) -> Result<ExchangeRateTable, StoreError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let payload: RatesPayload = response.json().await.map_err(|e| StoreError::Decode {
            url: self.url.clone(),
            message: e.to_string(),
        })?;
        let table = payload.into_table(self.base.clone());
        debug!(currencies = table.len(), base = %self.base, "Fetched exchange rates");
        Ok(table)
    }
}

#[async_trait]
impl ExchangeRateSource for HttpRateSource {
    async fn get_exchange_rates(&self) -> Result<ExchangeRateTable, DashboardError> {
        self.fetch().await.map_err(StoreError::into_fetch)
    }
}
