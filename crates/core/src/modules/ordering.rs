//! Module ordering: merge, sort, drag reorder, reset and save.
//!
//! The free functions are pure transitions over a module sequence.
//! [`ModuleOrderingEngine`] owns the sequence for one session and records
//! every change as an [`OrderIntent`] for write-through.

use std::collections::HashMap;

use dashbank_shared::types::ModuleId;
use tracing::debug;

use super::intents::{IntentKind, IntentQueue, OrderIntent};
use super::types::{ModuleDescriptor, PreferredOrderEntry, Role};
use crate::error::ValidationError;
use crate::selection::{Capacity, SelectionSet, Toggle};

/// Applies stored ranks to the catalog.
///
/// A stored rank above zero wins over `default_order`. Entries for modules
/// not in the catalog are ignored; for duplicates the first entry wins.
#[must_use]
pub fn merge(catalog: &[ModuleDescriptor], preferred: &[PreferredOrderEntry]) -> Vec<ModuleDescriptor> {
    let mut stored: HashMap<&ModuleId, u32> = HashMap::with_capacity(preferred.len());
    for entry in preferred {
        stored.entry(&entry.module_id).or_insert(entry.order);
    }

    catalog
        .iter()
        .map(|module| {
            let mut merged = module.clone();
            merged.order = match stored.get(&module.id) {
                Some(&order) if order > 0 => order,
                _ => module.default_order,
            };
            merged
        })
        .collect()
}

/// Sorts ascending by `order`, with unset (0) orders last.
///
/// The sort is stable, so ties and unset modules keep their relative order.
pub fn sort_modules(modules: &mut [ModuleDescriptor]) {
    modules.sort_by_key(|module| (module.order == 0, module.order));
}

/// Merges stored ranks into the catalog and returns the render sequence.
#[must_use]
pub fn ordered_modules(
    catalog: &[ModuleDescriptor],
    preferred: &[PreferredOrderEntry],
) -> Vec<ModuleDescriptor> {
    let mut modules = merge(catalog, preferred);
    sort_modules(&mut modules);
    modules
}

/// Assigns 1-based ranks following the sequence.
pub fn renumber(modules: &mut [ModuleDescriptor]) {
    for (module, order) in modules.iter_mut().zip(1u32..) {
        module.order = order;
    }
}

/// Moves `source` into `target`'s slot and renumbers the sequence.
///
/// The source is removed first and reinserted at the index the target had,
/// so dragging upward lands right before the target and dragging downward
/// lands right after it. Dragging `target` back onto `source` afterwards
/// restores which of the two comes first, though modules between them may
/// end up shifted.
///
/// # Errors
///
/// Returns `ValidationError::UnknownModule` if either id is not in `modules`.
pub fn move_module(
    modules: &mut Vec<ModuleDescriptor>,
    source: &ModuleId,
    target: &ModuleId,
) -> Result<(), ValidationError> {
    let from = position(modules, source)?;
    let to = position(modules, target)?;

    if from != to {
        let moved = modules.remove(from);
        modules.insert(to, moved);
    }
    renumber(modules);
    Ok(())
}

/// Pure form of [`move_module`] returning the new sequence.
///
/// # Errors
///
/// Returns `ValidationError::UnknownModule` if either id is not in `modules`.
pub fn reorder(
    modules: &[ModuleDescriptor],
    source: &ModuleId,
    target: &ModuleId,
) -> Result<Vec<ModuleDescriptor>, ValidationError> {
    let mut next = modules.to_vec();
    move_module(&mut next, source, target)?;
    Ok(next)
}

/// Catalog ranking: `default_order` ascending, zeros last, then renumbered.
#[must_use]
pub fn default_sequence(catalog: &[ModuleDescriptor]) -> Vec<ModuleDescriptor> {
    let mut modules: Vec<_> = catalog
        .iter()
        .map(|module| {
            let mut reset = module.clone();
            reset.order = module.default_order;
            reset
        })
        .collect();
    sort_modules(&mut modules);
    renumber(&mut modules);
    modules
}

/// Ranks for every module, as currently ordered.
#[must_use]
pub fn order_entries(modules: &[ModuleDescriptor]) -> Vec<PreferredOrderEntry> {
    modules
        .iter()
        .map(|module| PreferredOrderEntry::new(module.id.clone(), module.order))
        .collect()
}

/// 1-based ranks among the selected modules only, in sequence order.
#[must_use]
pub fn selected_ranks(
    modules: &[ModuleDescriptor],
    is_selected: impl Fn(&ModuleId) -> bool,
) -> Vec<PreferredOrderEntry> {
    modules
        .iter()
        .filter(|module| is_selected(&module.id))
        .zip(1u32..)
        .map(|(module, rank)| PreferredOrderEntry::new(module.id.clone(), rank))
        .collect()
}

fn position(modules: &[ModuleDescriptor], id: &ModuleId) -> Result<usize, ValidationError> {
    modules
        .iter()
        .position(|module| &module.id == id)
        .ok_or_else(|| ValidationError::UnknownModule(id.clone()))
}

/// Owns one user's module sequence and selection.
///
/// Changes apply locally first and are never rolled back; each one returns an
/// intent the caller writes through and reports back with
/// [`acknowledge`](Self::acknowledge) or [`fail`](Self::fail).
#[derive(Debug, Clone)]
pub struct ModuleOrderingEngine {
    catalog: Vec<ModuleDescriptor>,
    sequence: SelectionSet<ModuleDescriptor>,
    intents: IntentQueue,
}

impl ModuleOrderingEngine {
    /// Builds the session sequence from the catalog and stored preferences.
    ///
    /// Modules the role may not see are dropped. `selected` seeds the
    /// selection; when it is empty, modules with a stored rank start selected.
    #[must_use]
    pub fn new(
        catalog: Vec<ModuleDescriptor>,
        preferred: &[PreferredOrderEntry],
        selected: &[ModuleId],
        role: Role,
    ) -> Self {
        let catalog: Vec<_> = catalog
            .into_iter()
            .filter(|module| role.can_view(module))
            .collect();
        let modules = ordered_modules(&catalog, preferred);

        let seed: Vec<ModuleId> = if selected.is_empty() {
            preferred.iter().map(|entry| entry.module_id.clone()).collect()
        } else {
            selected.to_vec()
        };

        debug!(
            modules = modules.len(),
            stored = preferred.len(),
            role = %role,
            "Merged module catalog"
        );

        Self {
            catalog,
            sequence: SelectionSet::new(modules, Capacity::Unbounded).with_selected(seed),
            intents: IntentQueue::new(),
        }
    }

    /// Catalog ranking with nothing selected, used when preferences are unavailable.
    #[must_use]
    pub fn from_defaults(catalog: Vec<ModuleDescriptor>, role: Role) -> Self {
        Self::new(catalog, &[], &[], role)
    }

    /// Current sequence.
    #[must_use]
    pub fn modules(&self) -> &[ModuleDescriptor] {
        self.sequence.view()
    }

    /// Selected modules in sequence order.
    pub fn visible_modules(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.sequence.selected_items()
    }

    /// Returns true if `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: &ModuleId) -> bool {
        self.sequence.is_selected(id)
    }

    /// Flips one module's visibility.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownModule` if `id` is not in the sequence.
    pub fn toggle_selected(&mut self, id: &ModuleId) -> Result<Toggle, ValidationError> {
        position(self.sequence.view(), id)?;
        Ok(self.sequence.toggle(id))
    }

    /// Selects every module, or clears when all are selected.
    pub fn toggle_all(&mut self) {
        self.sequence.toggle_all();
    }

    /// Moves `source` into `target`'s slot and records a reorder intent.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownModule` if either id is not in the
    /// sequence; nothing changes in that case.
    pub fn reorder(
        &mut self,
        source: &ModuleId,
        target: &ModuleId,
    ) -> Result<OrderIntent, ValidationError> {
        move_module(self.sequence.view_mut(), source, target)?;
        let entries = order_entries(self.sequence.view());
        debug!(source = %source, target = %target, "Reordered modules");
        Ok(self.intents.issue(IntentKind::Reorder, entries, Vec::new()))
    }

    /// Restores catalog ranking and records a reset intent.
    pub fn reset(&mut self) -> OrderIntent {
        self.sequence.set_view(default_sequence(&self.catalog));
        let entries = order_entries(self.sequence.view());
        self.intents.issue(IntentKind::Reset, entries, Vec::new())
    }

    /// Packages the selection with ranks among the selected modules.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NothingSelected` if no module is selected;
    /// no intent is recorded in that case.
    pub fn prepare_save(&mut self) -> Result<OrderIntent, ValidationError> {
        if self.sequence.is_empty() {
            return Err(ValidationError::NothingSelected);
        }
        let entries = selected_ranks(self.sequence.view(), |id| self.sequence.is_selected(id));
        let selected = entries.iter().map(|entry| entry.module_id.clone()).collect();
        Ok(self.intents.issue(IntentKind::Save, entries, selected))
    }

    /// Records a successful write and returns the older intents it superseded.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownIntent` if `seq` is not queued.
    pub fn acknowledge(&mut self, seq: u64) -> Result<Vec<u64>, ValidationError> {
        self.intents.acknowledge(seq)
    }

    /// Records a failed write. Local state is kept.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownIntent` if `seq` is not queued.
    pub fn fail(&mut self, seq: u64, reason: impl Into<String>) -> Result<(), ValidationError> {
        self.intents.fail(seq, reason)
    }

    /// Returns a failed intent for manual resubmission.
    ///
    /// # Errors
    ///
    /// See [`IntentQueue::retry`].
    pub fn retry(&mut self, seq: u64) -> Result<OrderIntent, ValidationError> {
        self.intents.retry(seq)
    }

    /// Outstanding intents.
    #[must_use]
    pub const fn intents(&self) -> &IntentQueue {
        &self.intents
    }
}
