//! Exchange rate caching using Moka.
//!
//! Keeps the last fetched table for a configurable TTL. Failures are not
//! cached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashbank_core::DashboardError;
use dashbank_core::currency::ExchangeRateTable;
use dashbank_core::ports::ExchangeRateSource;
use moka::future::Cache;

/// Default time-to-live for the cached table (5 minutes).
const DEFAULT_TTL_SECS: u64 = 300;

/// TTL cache in front of any rate source.
#[derive(Clone)]
pub struct CachedRateSource {
    inner: Arc<dyn ExchangeRateSource>,
    cache: Cache<(), ExchangeRateTable>,
}

impl CachedRateSource {
    /// Wraps `inner` with the default TTL.
    #[must_use]
    pub fn new(inner: Arc<dyn ExchangeRateSource>) -> Self {
        Self::with_ttl(inner, DEFAULT_TTL_SECS)
    }

    /// Wraps `inner`, keeping a fetched table for `ttl_secs` seconds.
    #[must_use]
    pub fn with_ttl(inner: Arc<dyn ExchangeRateSource>, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();
        Self { inner, cache }
    }

    /// Drops the cached table so the next read refetches.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }
}

impl std::fmt::Debug for CachedRateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedRateSource")
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ExchangeRateSource for CachedRateSource {
    async fn get_exchange_rates(&self) -> Result<ExchangeRateTable, DashboardError> {
        let inner = Arc::clone(&self.inner);
        self.cache
            .try_get_with((), async move { inner.get_exchange_rates().await })
            .await
            .map_err(|err| (*err).clone())
    }
}
