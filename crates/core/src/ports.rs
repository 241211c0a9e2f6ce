//! Ports to the collaborators the dashboard reads from and writes to.
//!
//! Adapters live in `dashbank-store`. Every port is `Send + Sync` so a
//! session can run on either tokio runtime flavour.

use async_trait::async_trait;
use dashbank_shared::types::{ItemId, ModuleId, UserId};

use crate::aggregation::FinancialItem;
use crate::currency::ExchangeRateTable;
use crate::error::DashboardError;
use crate::modules::{ModuleDescriptor, ModuleType, PreferredOrderEntry, Role, SelectionPreference};

/// Source of reverse exchange rates against the base currency.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    /// Fetches the current rate table.
    async fn get_exchange_rates(&self) -> Result<ExchangeRateTable, DashboardError>;
}

/// Admin-managed module catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModuleCatalog: Send + Sync {
    /// Fetches the modules available to `role`.
    async fn fetch_module_catalog(&self, role: Role) -> Result<Vec<ModuleDescriptor>, DashboardError>;
}

/// Per-user dashboard preferences.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Stored module ranks.
    async fn get_preferred_order(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PreferredOrderEntry>, DashboardError>;

    /// Upserts module ranks.
    async fn update_preferred_order(
        &self,
        user_id: &UserId,
        entries: &[PreferredOrderEntry],
    ) -> Result<(), DashboardError>;

    /// Stored set of visible modules.
    async fn get_preferred_modules(&self, user_id: &UserId) -> Result<Vec<ModuleId>, DashboardError>;

    /// Replaces the set of visible modules.
    async fn post_preferred_modules(
        &self,
        user_id: &UserId,
        module_ids: &[ModuleId],
    ) -> Result<(), DashboardError>;

    /// Stores the items selected in one module.
    async fn post_selection_preference(
        &self,
        preference: &SelectionPreference,
    ) -> Result<(), DashboardError>;

    /// Items selected in one module.
    async fn get_selection_preference(
        &self,
        user_id: &UserId,
        module_type: ModuleType,
    ) -> Result<Vec<ItemId>, DashboardError>;
}

/// Collections of financial items.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CollectionSource: Send + Sync {
    /// Fetches every item of one collection.
    async fn fetch_collection(
        &self,
        collection: ModuleType,
    ) -> Result<Vec<FinancialItem>, DashboardError>;
}
