//! Application configuration management.

use std::collections::HashMap;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Document store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Exchange rate source configuration.
    #[serde(default)]
    pub rates: RatesConfig,
    /// Dashboard behaviour.
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the document-store API.
    #[serde(default = "default_store_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_store_url() -> String {
    "http://127.0.0.1:3000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_store_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Exchange rate source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// URL returning the current exchange rate table.
    #[serde(default = "default_rates_url")]
    pub url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How long a fetched table is reused before refetching.
    #[serde(default = "default_rates_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_rates_url() -> String {
    "http://127.0.0.1:3000/api/exchange-rates".to_string()
}

fn default_rates_ttl() -> u64 {
    300 // 5 minutes
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            url: default_rates_url(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_rates_ttl(),
        }
    }
}

/// Dashboard behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Currency all totals are expressed in.
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    /// Capacity used for module types without an explicit entry.
    #[serde(default = "default_capacity")]
    pub default_capacity: usize,
    /// Per-module capacities keyed by module type (`accounts`, `cards`, ...).
    #[serde(default)]
    pub capacities: HashMap<String, usize>,
    /// Lifetime of transient notices in seconds.
    #[serde(default = "default_notice_ttl")]
    pub notice_ttl_secs: u64,
}

fn default_base_currency() -> String {
    "BGN".to_string()
}

fn default_capacity() -> usize {
    5
}

fn default_notice_ttl() -> u64 {
    6
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            default_capacity: default_capacity(),
            capacities: HashMap::new(),
            notice_ttl_secs: default_notice_ttl(),
        }
    }
}

impl DashboardConfig {
    /// Returns the selection capacity for a module type.
    #[must_use]
    pub fn capacity_for(&self, module_type: &str) -> usize {
        self.capacities
            .get(module_type)
            .copied()
            .unwrap_or(self.default_capacity)
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("DASHBANK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
