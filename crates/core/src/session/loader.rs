//! Gated collection fetching.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::aggregation::{FinancialItem, ItemKind};
use crate::error::DashboardError;
use crate::fetch::{FetchGate, FetchOutcome};
use crate::modules::ModuleType;
use crate::ports::CollectionSource;

/// Collections fetched on every refresh.
///
/// `Transactions` is built from accounts and deposits, so it is not fetched.
pub const DASHBOARD_COLLECTIONS: [ModuleType; 7] = [
    ModuleType::Accounts,
    ModuleType::Cards,
    ModuleType::Payments,
    ModuleType::Liabilities,
    ModuleType::Credits,
    ModuleType::Deposits,
    ModuleType::Currencies,
];

/// Items fetched by one refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionSnapshot {
    collections: HashMap<ModuleType, Vec<FinancialItem>>,
    failed: Vec<ModuleType>,
    superseded: Vec<ModuleType>,
}

impl CollectionSnapshot {
    /// Every fetched item, in collection order.
    pub fn items(&self) -> impl Iterator<Item = &FinancialItem> {
        DASHBOARD_COLLECTIONS
            .iter()
            .filter_map(|collection| self.collections.get(collection))
            .flatten()
    }

    /// Items of one collection.
    #[must_use]
    pub fn collection(&self, collection: ModuleType) -> &[FinancialItem] {
        self.collections.get(&collection).map_or(&[], Vec::as_slice)
    }

    /// Items eligible for `module_type`'s visibility editor.
    #[must_use]
    pub fn universe(&self, module_type: ModuleType) -> Vec<FinancialItem> {
        let kinds: &[ItemKind] = module_type.universe();
        module_type
            .source_collections()
            .iter()
            .flat_map(|collection| self.collection(*collection))
            .filter(|item| kinds.contains(&item.kind))
            .cloned()
            .collect()
    }

    /// Collections that failed and are shown empty.
    #[must_use]
    pub fn failed(&self) -> &[ModuleType] {
        &self.failed
    }

    /// Collections whose fetch lost to a newer one.
    #[must_use]
    pub fn superseded(&self) -> &[ModuleType] {
        &self.superseded
    }

    /// Replaces one collection.
    pub fn insert(&mut self, collection: ModuleType, items: Vec<FinancialItem>) {
        self.collections.insert(collection, items);
    }

    /// Keeps `previous` items for every collection this snapshot did not win.
    pub fn backfill_superseded(&mut self, previous: &Self) {
        for collection in &self.superseded {
            if let Some(items) = previous.collections.get(collection) {
                self.collections.insert(*collection, items.clone());
            }
        }
    }
}

/// Fetches collections, one gate per collection.
///
/// Clones share the gates, so a newer fetch from any clone supersedes an
/// older one for the same collection.
#[derive(Clone)]
pub struct CollectionLoader {
    source: Arc<dyn CollectionSource>,
    gates: Arc<HashMap<ModuleType, FetchGate>>,
}

impl CollectionLoader {
    /// Creates a loader over `source`.
    #[must_use]
    pub fn new(source: Arc<dyn CollectionSource>) -> Self {
        let gates = ModuleType::ALL
            .into_iter()
            .map(|collection| (collection, FetchGate::new()))
            .collect();
        Self {
            source,
            gates: Arc::new(gates),
        }
    }

    /// Fetches one collection as the newest request for it.
    pub async fn fetch(
        &self,
        collection: ModuleType,
    ) -> FetchOutcome<Result<Vec<FinancialItem>, DashboardError>> {
        let fetch = self.source.fetch_collection(collection);
        match self.gates.get(&collection) {
            Some(gate) => gate.run(fetch).await,
            None => FetchOutcome::Completed(fetch.await),
        }
    }

    /// Fetches `collections` concurrently.
    ///
    /// A failed collection is left empty and listed in
    /// [`CollectionSnapshot::failed`]; the others still load.
    pub async fn load(&self, collections: &[ModuleType]) -> CollectionSnapshot {
        let outcomes = join_all(
            collections
                .iter()
                .map(|collection| async move { (*collection, self.fetch(*collection).await) }),
        )
        .await;

        let mut snapshot = CollectionSnapshot::default();
        for (collection, outcome) in outcomes {
            match outcome {
                FetchOutcome::Completed(Ok(items)) => {
                    debug!(collection = %collection, items = items.len(), "Loaded collection");
                    snapshot.insert(collection, items);
                }
                FetchOutcome::Completed(Err(err)) => {
                    warn!(collection = %collection, error = %err, "Collection unavailable");
                    snapshot.insert(collection, Vec::new());
                    snapshot.failed.push(collection);
                }
                FetchOutcome::Superseded => {
                    debug!(collection = %collection, "Collection fetch superseded");
                    snapshot.superseded.push(collection);
                }
            }
        }
        snapshot
    }
}

impl std::fmt::Debug for CollectionLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionLoader")
            .field("gates", &self.gates.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockCollectionSource;
    use dashbank_shared::types::CurrencyCode;

    fn item(id: &str, kind: ItemKind) -> FinancialItem {
        FinancialItem::new(id, kind, CurrencyCode::base())
    }

    fn source() -> MockCollectionSource {
        let mut source = MockCollectionSource::new();
        source
            .expect_fetch_collection()
            .returning(|collection| match collection {
                ModuleType::Accounts => Ok(vec![item("a1", ItemKind::Account)]),
                ModuleType::Deposits => Ok(vec![item("d1", ItemKind::Deposit)]),
                ModuleType::Cards => Err(DashboardError::TransientFetch("cards down".into())),
                _ => Ok(Vec::new()),
            });
        source
    }

    #[tokio::test]
    async fn test_failed_collection_is_empty_and_reported() {
        let loader = CollectionLoader::new(Arc::new(source()));

        let snapshot = loader.load(&DASHBOARD_COLLECTIONS).await;

        assert_eq!(snapshot.failed(), &[ModuleType::Cards]);
        assert!(snapshot.collection(ModuleType::Cards).is_empty());
        assert_eq!(snapshot.items().count(), 2);
        assert!(snapshot.superseded().is_empty());
    }

    #[tokio::test]
    async fn test_transactions_universe_joins_accounts_and_deposits() {
        let loader = CollectionLoader::new(Arc::new(source()));

        let snapshot = loader.load(&DASHBOARD_COLLECTIONS).await;
        let ids: Vec<_> = snapshot
            .universe(ModuleType::Transactions)
            .into_iter()
            .map(|item| item.id.into_inner())
            .collect();

        assert_eq!(ids, vec!["a1", "d1"]);
    }

    #[test]
    fn test_backfill_keeps_previous_items_for_superseded() {
        let mut previous = CollectionSnapshot::default();
        previous.insert(ModuleType::Accounts, vec![item("old", ItemKind::Account)]);
        let mut next = CollectionSnapshot {
            superseded: vec![ModuleType::Accounts],
            ..CollectionSnapshot::default()
        };

        next.backfill_superseded(&previous);

        assert_eq!(next.collection(ModuleType::Accounts).len(), 1);
    }
}
