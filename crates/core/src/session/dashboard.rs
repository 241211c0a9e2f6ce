//! One user's dashboard session.
//!
//! The session is the single writer of the module sequence. Fetch failures
//! degrade to empty or default state with a notice; write failures keep the
//! local change and leave a retryable notice. Nothing here aborts rendering.

use std::sync::Arc;

use chrono::Utc;
use dashbank_shared::types::{ItemId, ModuleId, UserId};
use serde::Serialize;
use tracing::{error, info, warn};

use super::loader::{CollectionLoader, CollectionSnapshot, DASHBOARD_COLLECTIONS};
use super::settings::SessionSettings;
use crate::aggregation::{AggregationEngine, AggregationWarning, FinancialItem, Totals, TotalsView};
use crate::currency::ExchangeRateTable;
use crate::error::{DashboardError, ValidationError};
use crate::modules::{
    IntentKind, ModuleDescriptor, ModuleOrderingEngine, ModuleType, ModuleVisibilityController,
    OrderIntent, PreferredOrderEntry, SelectionPreference,
};
use crate::notice::{Notice, NoticeBoard};
use crate::ports::{CollectionSource, ExchangeRateSource, ModuleCatalog, PreferenceStore};
use crate::selection::Toggle;

/// Collaborators a session talks to.
#[derive(Clone)]
pub struct DashboardPorts {
    /// Exchange rates.
    pub rates: Arc<dyn ExchangeRateSource>,
    /// Module catalog.
    pub catalog: Arc<dyn ModuleCatalog>,
    /// User preferences.
    pub preferences: Arc<dyn PreferenceStore>,
    /// Financial collections.
    pub collections: Arc<dyn CollectionSource>,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// Rendered totals.
    pub totals: TotalsView,
    /// Why totals are partial.
    pub warnings: Vec<AggregationWarning>,
    /// Selected modules in render order.
    pub modules: Vec<ModuleDescriptor>,
    /// Notices currently shown.
    pub notices: Vec<Notice>,
}

struct ModuleFetch {
    catalog: Result<Vec<ModuleDescriptor>, DashboardError>,
    order: Result<Vec<PreferredOrderEntry>, DashboardError>,
    selected: Result<Vec<ModuleId>, DashboardError>,
}

/// Dashboard state for one user.
pub struct DashboardSession {
    settings: SessionSettings,
    rate_source: Arc<dyn ExchangeRateSource>,
    catalog: Arc<dyn ModuleCatalog>,
    preferences: Arc<dyn PreferenceStore>,
    loader: CollectionLoader,
    aggregation: AggregationEngine,
    rates: ExchangeRateTable,
    rates_available: bool,
    snapshot: CollectionSnapshot,
    totals: Totals,
    modules: ModuleOrderingEngine,
    notices: NoticeBoard,
}

impl DashboardSession {
    /// Creates an empty session. Call [`load`](Self::load) to populate it.
    #[must_use]
    pub fn new(ports: DashboardPorts, settings: SessionSettings) -> Self {
        let aggregation = AggregationEngine::new(settings.layout.clone());
        let rates = ExchangeRateTable::new(settings.base_currency.clone());
        let totals = aggregation.compute_totals(&[], &rates);
        let modules = ModuleOrderingEngine::from_defaults(Vec::new(), settings.role);
        let notices = NoticeBoard::with_ttl_secs(settings.dashboard.notice_ttl_secs);

        Self {
            rate_source: ports.rates,
            catalog: ports.catalog,
            preferences: ports.preferences,
            loader: CollectionLoader::new(ports.collections),
            aggregation,
            rates,
            rates_available: true,
            snapshot: CollectionSnapshot::default(),
            totals,
            modules,
            notices,
            settings,
        }
    }

    /// Fetches rates, collections and modules concurrently and recomputes totals.
    pub async fn load(&mut self) {
        let (rates, snapshot, modules) = tokio::join!(
            self.rate_source.get_exchange_rates(),
            self.loader.load(&DASHBOARD_COLLECTIONS),
            self.fetch_modules(),
        );

        self.apply_rates(rates);
        self.apply_snapshot(snapshot);
        self.apply_modules(modules);
        self.recompute();
    }

    /// Refetches rates and recomputes totals.
    pub async fn refresh_rates(&mut self) {
        let rates = self.rate_source.get_exchange_rates().await;
        self.apply_rates(rates);
        self.recompute();
    }

    /// Refetches collections and recomputes totals.
    pub async fn refresh_collections(&mut self) {
        let snapshot = self.loader.load(&DASHBOARD_COLLECTIONS).await;
        self.apply_snapshot(snapshot);
        self.recompute();
    }

    /// Refetches the catalog and the stored order and selection.
    pub async fn load_modules(&mut self) {
        let modules = self.fetch_modules().await;
        self.apply_modules(modules);
    }

    /// Drags `source` into `target`'s slot and writes the new order through.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Validation` for unknown modules, or
    /// `DashboardError::Persistence` if the write failed. The local order
    /// is kept in the latter case.
    pub async fn reorder(&mut self, source: &ModuleId, target: &ModuleId) -> Result<(), DashboardError> {
        let intent = match self.modules.reorder(source, target) {
            Ok(intent) => intent,
            Err(err) => return Err(self.reject(err)),
        };
        self.write_intent(intent).await
    }

    /// Restores catalog ranking and writes it through.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Persistence` if the write failed.
    pub async fn reset_modules(&mut self) -> Result<(), DashboardError> {
        let intent = self.modules.reset();
        self.write_intent(intent).await
    }

    /// Flips one module's visibility locally; [`save_modules`](Self::save_modules) persists it.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Validation` if `id` is not in the sequence.
    pub fn toggle_module(&mut self, id: &ModuleId) -> Result<Toggle, DashboardError> {
        self.modules.toggle_selected(id).map_err(|err| self.reject(err))
    }

    /// Persists the selected modules with their ranks among the selection.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Validation` without calling the store when
    /// nothing is selected, or `DashboardError::Persistence` on write failure.
    pub async fn save_modules(&mut self) -> Result<(), DashboardError> {
        let intent = match self.modules.prepare_save() {
            Ok(intent) => intent,
            Err(err) => return Err(self.reject(err)),
        };
        self.write_intent(intent).await
    }

    /// Resubmits a failed write.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Validation` if `seq` is not a failed write or
    /// a newer change superseded it, or the write's own error.
    pub async fn retry(&mut self, seq: u64) -> Result<(), DashboardError> {
        let intent = match self.modules.retry(seq) {
            Ok(intent) => intent,
            Err(err) => return Err(self.reject(err)),
        };
        self.notices.dismiss_intent(seq);
        self.write_intent(intent).await
    }

    /// Opens the item editor for one module, seeded with the stored selection.
    ///
    /// If the stored selection cannot be fetched the editor opens empty.
    pub async fn open_visibility(&mut self, module_type: ModuleType) -> ModuleVisibilityController {
        let items = self.snapshot.universe(module_type);
        let editor = ModuleVisibilityController::new(
            module_type,
            &items,
            self.settings.capacity_for(module_type),
        );

        match self.stored_selection(module_type).await {
            Some(ids) => editor.with_stored(ids),
            None => editor,
        }
    }

    /// Saves an editor opened by [`open_visibility`](Self::open_visibility).
    ///
    /// # Errors
    ///
    /// Returns the editor's error; a notice is raised for it.
    pub async fn save_visibility(
        &mut self,
        editor: &mut ModuleVisibilityController,
    ) -> Result<SelectionPreference, DashboardError> {
        match editor.save(&self.settings.user_id, self.preferences.as_ref()).await {
            Ok(preference) => Ok(preference),
            Err(err) => {
                self.notices.raise_error(&err);
                Err(err)
            }
        }
    }

    /// Items shown in one module, from freshly fetched preferences.
    ///
    /// Stored order is kept; ids no longer in the snapshot are dropped.
    pub async fn visible_items(&mut self, module_type: ModuleType) -> Vec<FinancialItem> {
        let Some(ids) = self.stored_selection(module_type).await else {
            return Vec::new();
        };
        let universe = self.snapshot.universe(module_type);

        ids.iter()
            .filter_map(|id| universe.iter().find(|item| &item.id == id))
            .take(self.settings.capacity_for(module_type))
            .cloned()
            .collect()
    }

    /// Current totals.
    #[must_use]
    pub const fn totals(&self) -> &Totals {
        &self.totals
    }

    /// Module sequence and selection.
    #[must_use]
    pub const fn modules(&self) -> &ModuleOrderingEngine {
        &self.modules
    }

    /// Rate table in use.
    #[must_use]
    pub const fn rates(&self) -> &ExchangeRateTable {
        &self.rates
    }

    /// Items of the last refresh.
    #[must_use]
    pub const fn snapshot(&self) -> &CollectionSnapshot {
        &self.snapshot
    }

    /// Raised notices.
    #[must_use]
    pub const fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    /// Raised notices, for dismissal.
    pub fn notices_mut(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    /// Session settings.
    #[must_use]
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Shared collection loader; a fetch through a clone supersedes the session's.
    #[must_use]
    pub fn loader(&self) -> CollectionLoader {
        self.loader.clone()
    }

    /// Flattens the session for rendering.
    #[must_use]
    pub fn view(&self) -> DashboardView {
        DashboardView {
            totals: self.totals.view(),
            warnings: self.totals.warnings.clone(),
            modules: self.modules.visible_modules().cloned().collect(),
            notices: self.notices.active(Utc::now()).cloned().collect(),
        }
    }

    async fn fetch_modules(&self) -> ModuleFetch {
        let user_id = &self.settings.user_id;
        let (catalog, order, selected) = tokio::join!(
            self.catalog.fetch_module_catalog(self.settings.role),
            self.preferences.get_preferred_order(user_id),
            self.preferences.get_preferred_modules(user_id),
        );
        ModuleFetch {
            catalog,
            order,
            selected,
        }
    }

    fn apply_rates(&mut self, rates: Result<ExchangeRateTable, DashboardError>) {
        match rates {
            Ok(table) => {
                self.rates = table;
                self.rates_available = true;
            }
            Err(err) => {
                warn!(error = %err, "Exchange rates unavailable, counting base currency only");
                self.notices.raise_error(&err);
                self.rates = ExchangeRateTable::new(self.settings.base_currency.clone());
                self.rates_available = false;
            }
        }
    }

    fn apply_snapshot(&mut self, mut snapshot: CollectionSnapshot) {
        snapshot.backfill_superseded(&self.snapshot);
        for collection in snapshot.failed() {
            let err = DashboardError::TransientFetch(format!("{collection} could not be loaded"));
            self.notices.raise_error(&err);
        }
        self.snapshot = snapshot;
    }

    fn apply_modules(&mut self, fetch: ModuleFetch) {
        let role = self.settings.role;
        let user_id = &self.settings.user_id;

        self.modules = match fetch {
            ModuleFetch {
                catalog: Err(err), ..
            } => {
                warn!(user_id = %user_id, error = %err, "Module catalog unavailable");
                self.notices.raise_error(&err);
                ModuleOrderingEngine::from_defaults(Vec::new(), role)
            }
            ModuleFetch {
                catalog: Ok(catalog),
                order: Err(err),
                ..
            }
            | ModuleFetch {
                catalog: Ok(catalog),
                selected: Err(err),
                ..
            } => {
                warn!(user_id = %user_id, error = %err, "Module preferences unavailable, using defaults");
                self.notices.raise_error(&err);
                ModuleOrderingEngine::from_defaults(catalog, role)
            }
            ModuleFetch {
                catalog: Ok(catalog),
                order: Ok(order),
                selected: Ok(selected),
            } => ModuleOrderingEngine::new(catalog, &order, &selected, role),
        };
    }

    fn recompute(&mut self) {
        self.notices.purge_expired(Utc::now());
        let items: Vec<FinancialItem> = self.snapshot.items().cloned().collect();
        self.totals = self.aggregation.compute_totals(&items, &self.rates);
        if !self.rates_available {
            self.totals.push_warning(AggregationWarning::RatesUnavailable);
        }
    }

    async fn stored_selection(&mut self, module_type: ModuleType) -> Option<Vec<ItemId>> {
        match self
            .preferences
            .get_selection_preference(&self.settings.user_id, module_type)
            .await
        {
            Ok(ids) => Some(ids),
            Err(err) => {
                warn!(
                    user_id = %self.settings.user_id,
                    module_type = %module_type,
                    error = %err,
                    "Stored selection unavailable"
                );
                self.notices.raise_error(&err);
                None
            }
        }
    }

    async fn write_intent(&mut self, intent: OrderIntent) -> Result<(), DashboardError> {
        let result = write_through(self.preferences.as_ref(), &self.settings.user_id, &intent).await;

        match result {
            Ok(()) => {
                info!(
                    user_id = %self.settings.user_id,
                    seq = intent.seq,
                    kind = ?intent.kind,
                    "Saved module order"
                );
                for superseded in self.modules.acknowledge(intent.seq)? {
                    self.notices.dismiss_intent(superseded);
                }
                Ok(())
            }
            Err(err) => {
                let err = match err {
                    DashboardError::TransientFetch(msg) => DashboardError::Persistence(msg),
                    other => other,
                };
                error!(
                    user_id = %self.settings.user_id,
                    seq = intent.seq,
                    kind = ?intent.kind,
                    error = %err,
                    "Failed to save module order"
                );
                self.modules.fail(intent.seq, err.to_string())?;
                self.notices.raise_for_intent(intent.seq, &err);
                Err(err)
            }
        }
    }

    fn reject(&mut self, err: ValidationError) -> DashboardError {
        let err = DashboardError::from(err);
        self.notices.raise_error(&err);
        err
    }
}

impl std::fmt::Debug for DashboardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardSession")
            .field("settings", &self.settings)
            .field("rates_available", &self.rates_available)
            .field("totals", &self.totals)
            .field("modules", &self.modules)
            .finish_non_exhaustive()
    }
}

async fn write_through(
    store: &dyn PreferenceStore,
    user_id: &UserId,
    intent: &OrderIntent,
) -> Result<(), DashboardError> {
    if intent.kind == IntentKind::Save {
        store.post_preferred_modules(user_id, &intent.selected).await?;
    }
    store.update_preferred_order(user_id, &intent.entries).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::ItemKind;
    use crate::currency::ReverseRate;
    use crate::modules::Role;
    use crate::notice::NoticeKind;
    use crate::ports::{
        MockCollectionSource, MockExchangeRateSource, MockModuleCatalog, MockPreferenceStore,
    };
    use dashbank_shared::types::CurrencyCode;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn rates_ok() -> MockExchangeRateSource {
        let mut rates = MockExchangeRateSource::new();
        rates.expect_get_exchange_rates().returning(|| {
            let mut table = ExchangeRateTable::empty();
            table.insert(code("EUR"), ReverseRate::new(dec!(0.511292)).unwrap());
            Ok(table)
        });
        rates
    }

    fn rates_down() -> MockExchangeRateSource {
        let mut rates = MockExchangeRateSource::new();
        rates
            .expect_get_exchange_rates()
            .returning(|| Err(DashboardError::TransientFetch("rates timeout".into())));
        rates
    }

    fn catalog_ok() -> MockModuleCatalog {
        let mut catalog = MockModuleCatalog::new();
        catalog.expect_fetch_module_catalog().returning(|_| {
            Ok(vec![
                ModuleDescriptor::new("1", "Accounts", 1),
                ModuleDescriptor::new("2", "Cards", 2),
                ModuleDescriptor::new("3", "Deposits", 3),
            ])
        });
        catalog
    }

    fn collections() -> MockCollectionSource {
        let mut source = MockCollectionSource::new();
        source
            .expect_fetch_collection()
            .returning(|collection| match collection {
                ModuleType::Accounts => Ok(vec![
                    FinancialItem::new("a1", ItemKind::Account, code("BGN"))
                        .with_field("currentBalance", "100"),
                    FinancialItem::new("a2", ItemKind::Account, code("EUR"))
                        .with_field("currentBalance", "50"),
                ]),
                ModuleType::Deposits => Ok(vec![FinancialItem::new(
                    "d1",
                    ItemKind::Deposit,
                    code("BGN"),
                )]),
                _ => Ok(Vec::new()),
            });
        source
    }

    fn stored_preferences() -> MockPreferenceStore {
        let mut store = MockPreferenceStore::new();
        store
            .expect_get_preferred_order()
            .returning(|_| Ok(vec![PreferredOrderEntry::new("3", 1), PreferredOrderEntry::new("1", 2)]));
        store
            .expect_get_preferred_modules()
            .returning(|_| Ok(vec![ModuleId::from("3"), ModuleId::from("1")]));
        store
    }

    fn session(
        rates: MockExchangeRateSource,
        catalog: MockModuleCatalog,
        preferences: MockPreferenceStore,
    ) -> DashboardSession {
        DashboardSession::new(
            DashboardPorts {
                rates: Arc::new(rates),
                catalog: Arc::new(catalog),
                preferences: Arc::new(preferences),
                collections: Arc::new(collections()),
            },
            SessionSettings::new(UserId::from("u1"), Role::User),
        )
    }

    fn ids(modules: &[ModuleDescriptor]) -> Vec<&str> {
        modules.iter().map(|m| m.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_computes_totals_and_orders_modules() {
        let mut session = session(rates_ok(), catalog_ok(), stored_preferences());

        session.load().await;

        assert_eq!(session.totals().current_balance.render(), "197.79");
        assert!(!session.totals().is_partial());
        assert_eq!(ids(session.modules().modules()), vec!["3", "1", "2"]);
        let view = session.view();
        assert_eq!(ids(&view.modules), vec!["3", "1"]);
        assert!(view.notices.is_empty());
    }

    #[tokio::test]
    async fn test_rates_failure_degrades_to_base_currency() {
        let mut session = session(rates_down(), catalog_ok(), stored_preferences());

        session.load().await;

        assert_eq!(session.totals().current_balance.value, dec!(100));
        assert!(
            session
                .totals()
                .warnings
                .contains(&AggregationWarning::RatesUnavailable)
        );
        assert_eq!(session.notices().all()[0].kind, NoticeKind::Transient);
    }

    #[tokio::test]
    async fn test_catalog_failure_renders_empty_module_list() {
        let mut catalog = MockModuleCatalog::new();
        catalog
            .expect_fetch_module_catalog()
            .returning(|_| Err(DashboardError::TransientFetch("catalog down".into())));
        let mut session = session(rates_ok(), catalog, stored_preferences());

        session.load().await;

        assert!(session.modules().modules().is_empty());
        assert_eq!(session.notices().len(), 1);
        assert_eq!(session.totals().current_balance.render(), "197.79");
    }

    #[tokio::test]
    async fn test_order_failure_falls_back_to_defaults_unselected() {
        let mut store = MockPreferenceStore::new();
        store
            .expect_get_preferred_order()
            .returning(|_| Err(DashboardError::TransientFetch("prefs down".into())));
        store.expect_get_preferred_modules().returning(|_| Ok(Vec::new()));
        let mut session = session(rates_ok(), catalog_ok(), store);

        session.load_modules().await;

        assert_eq!(ids(session.modules().modules()), vec!["1", "2", "3"]);
        assert_eq!(session.modules().visible_modules().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_reorder_keeps_order_and_can_be_retried() {
        let mut store = stored_preferences();
        let mut calls = 0;
        store
            .expect_update_preferred_order()
            .times(2)
            .returning(move |_, _| {
                calls += 1;
                if calls == 1 {
                    Err(DashboardError::Persistence("503".into()))
                } else {
                    Ok(())
                }
            });
        let mut session = session(rates_ok(), catalog_ok(), store);
        session.load_modules().await;

        let err = session
            .reorder(&ModuleId::from("2"), &ModuleId::from("3"))
            .await
            .unwrap_err();

        assert_eq!(err, DashboardError::Persistence("503".into()));
        assert_eq!(ids(session.modules().modules()), vec!["2", "3", "1"]);
        let notice = &session.notices().all()[0];
        assert_eq!(notice.kind, NoticeKind::Persistence);
        assert_eq!(notice.intent_seq, Some(1));

        session.retry(1).await.unwrap();

        assert!(session.notices().is_empty());
        assert!(session.modules().intents().is_empty());
    }

    #[tokio::test]
    async fn test_save_without_selection_never_writes() {
        let mut store = MockPreferenceStore::new();
        store.expect_get_preferred_order().returning(|_| Ok(Vec::new()));
        store.expect_get_preferred_modules().returning(|_| Ok(Vec::new()));
        let mut session = session(rates_ok(), catalog_ok(), store);
        session.load_modules().await;

        let err = session.save_modules().await.unwrap_err();

        assert_eq!(err, DashboardError::Validation(ValidationError::NothingSelected));
        assert_eq!(session.notices().all()[0].kind, NoticeKind::Validation);
    }

    #[tokio::test]
    async fn test_save_posts_selection_then_ranks() {
        let mut store = MockPreferenceStore::new();
        store.expect_get_preferred_order().returning(|_| Ok(Vec::new()));
        store.expect_get_preferred_modules().returning(|_| Ok(Vec::new()));
        store
            .expect_post_preferred_modules()
            .withf(|_, ids| ids == [ModuleId::from("1"), ModuleId::from("3")])
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_update_preferred_order()
            .withf(|_, entries| {
                entries == [PreferredOrderEntry::new("1", 1), PreferredOrderEntry::new("3", 2)]
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let mut session = session(rates_ok(), catalog_ok(), store);
        session.load_modules().await;

        session.toggle_module(&ModuleId::from("3")).unwrap();
        session.toggle_module(&ModuleId::from("1")).unwrap();
        session.save_modules().await.unwrap();

        assert!(session.modules().intents().is_empty());
    }

    #[tokio::test]
    async fn test_visibility_editor_uses_configured_capacity() {
        let mut store = stored_preferences();
        store
            .expect_get_selection_preference()
            .returning(|_, _| Ok(vec![ItemId::from("d1"), ItemId::from("gone")]));
        store
            .expect_post_selection_preference()
            .returning(|_| Err(DashboardError::Persistence("503".into())));
        let mut session = session(rates_ok(), catalog_ok(), store);
        session.load().await;

        let mut editor = session.open_visibility(ModuleType::Transactions).await;

        assert_eq!(editor.selection().view().len(), 3);
        assert_eq!(editor.selection().selected_ids(), &[ItemId::from("d1")]);
        assert_eq!(editor.remaining(), 4);

        assert!(session.save_visibility(&mut editor).await.is_err());
        assert!(editor.is_open());

        let shown = session.visible_items(ModuleType::Transactions).await;
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].id.as_str(), "d1");
    }

    /// Serves accounts named after the call number, parking call `held` until released.
    struct HeldAccounts {
        calls: std::sync::atomic::AtomicUsize,
        held: usize,
        release: std::sync::Mutex<Option<tokio::sync::oneshot::Receiver<()>>>,
    }

    impl HeldAccounts {
        fn new(held: usize) -> (Arc<Self>, tokio::sync::oneshot::Sender<()>) {
            let (tx, rx) = tokio::sync::oneshot::channel();
            let source = Arc::new(Self {
                calls: std::sync::atomic::AtomicUsize::new(0),
                held,
                release: std::sync::Mutex::new(Some(rx)),
            });
            (source, tx)
        }

        fn started(&self) -> usize {
            self.calls.load(std::sync::atomic::Ordering::SeqCst)
        }

        async fn wait_started(&self, calls: usize) {
            while self.started() < calls {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait::async_trait]
    impl CollectionSource for HeldAccounts {
        async fn fetch_collection(
            &self,
            collection: ModuleType,
        ) -> Result<Vec<FinancialItem>, DashboardError> {
            if collection != ModuleType::Accounts {
                return Ok(Vec::new());
            }
            let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if call == self.held {
                let release = self.release.lock().unwrap().take();
                if let Some(release) = release {
                    let _ = release.await;
                }
            }
            Ok(vec![
                FinancialItem::new(format!("accounts-{call}"), ItemKind::Account, code("BGN"))
                    .with_field("currentBalance", "10"),
            ])
        }
    }

    fn session_over(collections: Arc<HeldAccounts>) -> DashboardSession {
        DashboardSession::new(
            DashboardPorts {
                rates: Arc::new(rates_ok()),
                catalog: Arc::new(catalog_ok()),
                preferences: Arc::new(stored_preferences()),
                collections,
            },
            SessionSettings::new(UserId::from("u1"), Role::User),
        )
    }

    fn account_ids(snapshot: &CollectionSnapshot) -> Vec<&str> {
        snapshot
            .collection(ModuleType::Accounts)
            .iter()
            .map(|item| item.id.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_newer_session_refresh_wins_over_held_loader_fetch() {
        let (source, release) = HeldAccounts::new(0);
        let mut session = session_over(source.clone());

        let older = session.loader();
        let held = tokio::spawn(async move { older.load(&[ModuleType::Accounts]).await });
        source.wait_started(1).await;

        session.refresh_collections().await;
        let _ = release.send(());
        let stale = held.await.unwrap();

        assert_eq!(stale.superseded(), &[ModuleType::Accounts]);
        assert!(stale.collection(ModuleType::Accounts).is_empty());
        assert_eq!(account_ids(session.snapshot()), vec!["accounts-1"]);
        assert_eq!(session.totals().current_balance.value, dec!(10));
    }

    #[tokio::test]
    async fn test_held_session_refresh_is_superseded_by_loader_clone() {
        let (source, release) = HeldAccounts::new(1);
        let mut session = session_over(source.clone());
        session.load().await;
        assert_eq!(account_ids(session.snapshot()), vec!["accounts-0"]);

        let newer = session.loader();
        let ((), fresh) = tokio::join!(session.refresh_collections(), async {
            source.wait_started(2).await;
            let fresh = newer.load(&[ModuleType::Accounts]).await;
            let _ = release.send(());
            fresh
        });

        assert_eq!(account_ids(&fresh), vec!["accounts-2"]);
        // the held response never lands; the previous items are kept
        assert_eq!(account_ids(session.snapshot()), vec!["accounts-0"]);
        assert!(session.snapshot().superseded().contains(&ModuleType::Accounts));
    }
}
