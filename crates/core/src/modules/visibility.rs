//! Per-module item visibility editor.

use dashbank_shared::types::{ItemId, UserId};
use tracing::{error, info};

use super::types::{ModuleType, SelectionPreference};
use crate::aggregation::FinancialItem;
use crate::error::{DashboardError, ValidationError};
use crate::ports::PreferenceStore;
use crate::selection::{Capacity, SelectionSet, Toggle};

/// Builds a bounded selection over the items eligible for `module_type`.
///
/// `Transactions` offers accounts and deposits together under one capacity.
#[must_use]
pub fn selection_set_for(
    module_type: ModuleType,
    items: &[FinancialItem],
    capacity: Capacity,
) -> SelectionSet<FinancialItem> {
    let universe = module_type.universe();
    let eligible = items
        .iter()
        .filter(|item| universe.contains(&item.kind))
        .cloned()
        .collect();
    SelectionSet::new(eligible, capacity)
}

/// Editor lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    /// Accepting edits.
    Open,
    /// Saved; the caller re-renders from fresh preferences.
    Closed,
}

/// Chooses which items of one module type are shown, up to a capacity.
#[derive(Debug, Clone)]
pub struct ModuleVisibilityController {
    module_type: ModuleType,
    selection: SelectionSet<FinancialItem>,
    state: EditorState,
}

impl ModuleVisibilityController {
    /// Opens an editor over `items` with room for `capacity` selections.
    #[must_use]
    pub fn new(module_type: ModuleType, items: &[FinancialItem], capacity: usize) -> Self {
        Self {
            module_type,
            selection: selection_set_for(module_type, items, Capacity::Bounded(capacity)),
            state: EditorState::Open,
        }
    }

    /// Seeds the selection with stored ids.
    #[must_use]
    pub fn with_stored(mut self, ids: impl IntoIterator<Item = ItemId>) -> Self {
        self.selection = self.selection.with_selected(ids);
        self
    }

    /// Module being edited.
    #[must_use]
    pub const fn module_type(&self) -> ModuleType {
        self.module_type
    }

    /// Underlying selection.
    #[must_use]
    pub const fn selection(&self) -> &SelectionSet<FinancialItem> {
        &self.selection
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> EditorState {
        self.state
    }

    /// Returns true until a save succeeds.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == EditorState::Open
    }

    /// Checkbox press. Silent no-op at capacity.
    pub fn toggle(&mut self, id: &ItemId) -> Toggle {
        self.selection.toggle(id)
    }

    /// "Select all" press.
    pub fn toggle_all(&mut self) {
        self.selection.toggle_all();
    }

    /// Selects `id`, reporting why it could not be selected.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownItem` if `id` is not eligible, or
    /// `ValidationError::CapacityExceeded` if the budget is spent.
    pub fn try_select(&mut self, id: &ItemId) -> Result<(), ValidationError> {
        if self.selection.is_selected(id) {
            return Ok(());
        }
        if !self.selection.view().iter().any(|item| &item.id == id) {
            return Err(ValidationError::UnknownItem(id.clone()));
        }
        if let (true, Capacity::Bounded(capacity)) = (self.selection.is_full(), self.selection.capacity()) {
            return Err(ValidationError::CapacityExceeded { capacity });
        }
        self.selection.toggle(id);
        Ok(())
    }

    /// Remaining budget.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.selection.remaining().unwrap_or(usize::MAX)
    }

    /// Builds the payload for the preference store.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EditorClosed` after a successful save and
    /// `ValidationError::NothingSelected` for an empty selection.
    pub fn package(&self, user_id: &UserId) -> Result<SelectionPreference, ValidationError> {
        if !self.is_open() {
            return Err(ValidationError::EditorClosed);
        }
        if self.selection.is_empty() {
            return Err(ValidationError::NothingSelected);
        }
        Ok(SelectionPreference {
            user_id: user_id.clone(),
            selected_ids: self.selection.selected_ids().to_vec(),
            module_type: self.module_type,
        })
    }

    /// Validates, posts the selection and closes on success.
    ///
    /// On failure the editor stays open with its selection intact.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Validation` without calling the store when
    /// [`package`](Self::package) rejects, or the store's error.
    pub async fn save<S>(
        &mut self,
        user_id: &UserId,
        store: &S,
    ) -> Result<SelectionPreference, DashboardError>
    where
        S: PreferenceStore + ?Sized,
    {
        let preference = self.package(user_id)?;

        match store.post_selection_preference(&preference).await {
            Ok(()) => {
                info!(
                    user_id = %user_id,
                    module_type = %self.module_type,
                    selected = preference.selected_ids.len(),
                    "Saved module selection"
                );
                self.state = EditorState::Closed;
                Ok(preference)
            }
            Err(err) => {
                error!(
                    user_id = %user_id,
                    module_type = %self.module_type,
                    error = %err,
                    "Failed to save module selection"
                );
                Err(err)
            }
        }
    }
}
