//! In-memory implementation of every port, with failure injection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use dashbank_core::DashboardError;
use dashbank_core::aggregation::FinancialItem;
use dashbank_core::currency::ExchangeRateTable;
use dashbank_core::modules::{
    ModuleDescriptor, ModuleType, PreferredOrderEntry, Role, SelectionPreference,
};
use dashbank_core::ports::{CollectionSource, ExchangeRateSource, ModuleCatalog, PreferenceStore};
use dashbank_shared::types::{ItemId, ModuleId, UserId};
use dashmap::DashMap;

use crate::error::StoreError;

/// Port operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `get_exchange_rates`.
    Rates,
    /// `fetch_module_catalog`.
    Catalog,
    /// `get_preferred_order`.
    ReadOrder,
    /// `update_preferred_order`.
    WriteOrder,
    /// `get_preferred_modules`.
    ReadModules,
    /// `post_preferred_modules`.
    WriteModules,
    /// `get_selection_preference`.
    ReadSelection,
    /// `post_selection_preference`.
    WriteSelection,
    /// `fetch_collection` for one collection.
    Collection(ModuleType),
}

impl Operation {
    const fn is_write(self) -> bool {
        matches!(
            self,
            Self::WriteOrder | Self::WriteModules | Self::WriteSelection
        )
    }
}

/// Store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    catalog: RwLock<Vec<ModuleDescriptor>>,
    rates: RwLock<ExchangeRateTable>,
    orders: DashMap<UserId, Vec<PreferredOrderEntry>>,
    modules: DashMap<UserId, Vec<ModuleId>>,
    selections: DashMap<(UserId, ModuleType), Vec<ItemId>>,
    collections: DashMap<ModuleType, Vec<FinancialItem>>,
    failures: DashMap<Operation, String>,
    writes: AtomicUsize,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the module catalog.
    #[must_use]
    pub fn with_catalog(self, catalog: Vec<ModuleDescriptor>) -> Self {
        *write(&self.catalog) = catalog;
        self
    }

    /// Replaces the rate table.
    #[must_use]
    pub fn with_rates(self, rates: ExchangeRateTable) -> Self {
        *write(&self.rates) = rates;
        self
    }

    /// Replaces one collection.
    #[must_use]
    pub fn with_collection(self, collection: ModuleType, items: Vec<FinancialItem>) -> Self {
        self.collections.insert(collection, items);
        self
    }

    /// Seeds a user's stored ranks.
    #[must_use]
    pub fn with_order(self, user_id: &UserId, entries: Vec<PreferredOrderEntry>) -> Self {
        self.orders.insert(user_id.clone(), entries);
        self
    }

    /// Seeds a user's visible modules.
    #[must_use]
    pub fn with_modules(self, user_id: &UserId, ids: Vec<ModuleId>) -> Self {
        self.modules.insert(user_id.clone(), ids);
        self
    }

    /// Makes `operation` fail until [`heal`](Self::heal) is called.
    pub fn fail(&self, operation: Operation, message: impl Into<String>) {
        self.failures.insert(operation, message.into());
    }

    /// Stops failing `operation`.
    pub fn heal(&self, operation: Operation) {
        self.failures.remove(&operation);
    }

    /// Stored ranks for `user_id`, sorted by rank.
    #[must_use]
    pub fn stored_order(&self, user_id: &UserId) -> Vec<PreferredOrderEntry> {
        let mut entries = self
            .orders
            .get(user_id)
            .map(|e| e.value().clone())
            .unwrap_or_default();
        entries.sort_by_key(|entry| entry.order);
        entries
    }

    /// Stored visible modules for `user_id`.
    #[must_use]
    pub fn stored_modules(&self, user_id: &UserId) -> Vec<ModuleId> {
        self.modules
            .get(user_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    /// Stored item selection.
    #[must_use]
    pub fn stored_selection(&self, user_id: &UserId, module_type: ModuleType) -> Vec<ItemId> {
        self.selections
            .get(&(user_id.clone(), module_type))
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self, operation: Operation) -> Result<(), DashboardError> {
        match self.failures.get(&operation) {
            Some(message) => {
                let err = StoreError::Injected(message.value().clone());
                Err(if operation.is_write() {
                    err.into_write()
                } else {
                    err.into_fetch()
                })
            }
            None => Ok(()),
        }
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl ExchangeRateSource for InMemoryStore {
    async fn get_exchange_rates(&self) -> Result<ExchangeRateTable, DashboardError> {
        self.check(Operation::Rates)?;
        Ok(read(&self.rates).clone())
    }
}

#[async_trait]
impl ModuleCatalog for InMemoryStore {
    async fn fetch_module_catalog(&self, role: Role) -> Result<Vec<ModuleDescriptor>, DashboardError> {
        self.check(Operation::Catalog)?;
        Ok(read(&self.catalog)
            .iter()
            .filter(|module| role.can_view(module))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PreferenceStore for InMemoryStore {
    async fn get_preferred_order(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PreferredOrderEntry>, DashboardError> {
        self.check(Operation::ReadOrder)?;
        Ok(self.stored_order(user_id))
    }

    async fn update_preferred_order(
        &self,
        user_id: &UserId,
        entries: &[PreferredOrderEntry],
    ) -> Result<(), DashboardError> {
        self.check(Operation::WriteOrder)?;
        let mut stored = self.orders.entry(user_id.clone()).or_default();
        for entry in entries {
            match stored.iter_mut().find(|s| s.module_id == entry.module_id) {
                Some(existing) => existing.order = entry.order,
                None => stored.push(entry.clone()),
            }
        }
        drop(stored);
        self.record_write();
        Ok(())
    }

    async fn get_preferred_modules(&self, user_id: &UserId) -> Result<Vec<ModuleId>, DashboardError> {
        self.check(Operation::ReadModules)?;
        Ok(self.stored_modules(user_id))
    }

    async fn post_preferred_modules(
        &self,
        user_id: &UserId,
        module_ids: &[ModuleId],
    ) -> Result<(), DashboardError> {
        self.check(Operation::WriteModules)?;
        self.modules.insert(user_id.clone(), module_ids.to_vec());
        self.record_write();
        Ok(())
    }

    async fn post_selection_preference(
        &self,
        preference: &SelectionPreference,
    ) -> Result<(), DashboardError> {
        self.check(Operation::WriteSelection)?;
        self.selections.insert(
            (preference.user_id.clone(), preference.module_type),
            preference.selected_ids.clone(),
        );
        self.record_write();
        Ok(())
    }

    async fn get_selection_preference(
        &self,
        user_id: &UserId,
        module_type: ModuleType,
    ) -> Result<Vec<ItemId>, DashboardError> {
        self.check(Operation::ReadSelection)?;
        Ok(self.stored_selection(user_id, module_type))
    }
}

#[async_trait]
impl CollectionSource for InMemoryStore {
    async fn fetch_collection(
        &self,
        collection: ModuleType,
    ) -> Result<Vec<FinancialItem>, DashboardError> {
        self.check(Operation::Collection(collection))?;
        Ok(self
            .collections
            .get(&collection)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }
}
