//! Per-session settings derived from configuration.

use dashbank_shared::config::DashboardConfig;
use dashbank_shared::types::{CurrencyCode, UserId};
use dashbank_shared::{AppError, AppResult};
use tracing::warn;

use crate::aggregation::TotalsLayout;
use crate::modules::{ModuleType, Role};

/// Who the session is for and how it behaves.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Current user.
    pub user_id: UserId,
    /// Role the catalog is fetched for.
    pub role: Role,
    /// Currency totals are expressed in.
    pub base_currency: CurrencyCode,
    /// Capacities and notice lifetime.
    pub dashboard: DashboardConfig,
    /// Fields summed into the totals.
    pub layout: TotalsLayout,
}

impl SessionSettings {
    /// Settings with built-in defaults.
    #[must_use]
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            base_currency: CurrencyCode::base(),
            dashboard: DashboardConfig::default(),
            layout: TotalsLayout::default(),
        }
    }

    /// Builds settings from the `dashboard` config section.
    ///
    /// Capacity keys that name no module type are logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `base_currency` is not a currency code.
    pub fn from_config(user_id: UserId, role: Role, config: &DashboardConfig) -> AppResult<Self> {
        let base_currency = CurrencyCode::parse(&config.base_currency)
            .map_err(|e| AppError::Config(format!("dashboard.base_currency: {e}")))?;

        for key in config.capacities.keys() {
            if key.parse::<ModuleType>().is_err() {
                warn!(key = %key, "Capacity configured for unknown module type");
            }
        }

        Ok(Self {
            user_id,
            role,
            base_currency,
            dashboard: config.clone(),
            layout: TotalsLayout::default(),
        })
    }

    /// Selection capacity for `module_type`.
    #[must_use]
    pub fn capacity_for(&self, module_type: ModuleType) -> usize {
        self.dashboard.capacity_for(module_type.as_str())
    }
}
