//! Bounded multi-select over the items currently in view.

use std::fmt::Debug;
use std::hash::Hash;

use dashbank_shared::types::{ItemId, ModuleId};
use serde::{Deserialize, Serialize};

use crate::aggregation::FinancialItem;
use crate::modules::types::ModuleDescriptor;

/// Anything a checkbox list can select.
pub trait Selectable {
    /// Key stored in the selection.
    type Id: Clone + Eq + Hash + Ord + Debug;

    /// Returns the item's key.
    fn selection_id(&self) -> &Self::Id;
}

impl Selectable for FinancialItem {
    type Id = ItemId;

    fn selection_id(&self) -> &ItemId {
        &self.id
    }
}

impl Selectable for ModuleDescriptor {
    type Id = ModuleId;

    fn selection_id(&self) -> &ModuleId {
        &self.id
    }
}

/// Maximum number of selected items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capacity {
    /// At most this many.
    Bounded(usize),
    /// No limit.
    Unbounded,
}

impl Capacity {
    /// Returns true if `count` selected items leave room for one more.
    #[must_use]
    pub const fn has_room(self, count: usize) -> bool {
        match self {
            Self::Bounded(max) => count < max,
            Self::Unbounded => true,
        }
    }
}

/// Outcome of a single toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// The item is now selected.
    Selected,
    /// The item is no longer selected.
    Deselected,
    /// Nothing changed (at capacity, or the item is not in view).
    Ignored,
}

/// Bounded selection over a view of items.
///
/// Invariant: the number of selected ids never exceeds the capacity. Adding
/// at capacity is a silent no-op; removing is always allowed. Selected ids
/// keep the order in which they were selected.
#[derive(Debug, Clone)]
pub struct SelectionSet<T: Selectable> {
    view: Vec<T>,
    selected: Vec<T::Id>,
    capacity: Capacity,
}

impl<T: Selectable> SelectionSet<T> {
    /// Creates an empty selection over `view`.
    #[must_use]
    pub const fn new(view: Vec<T>, capacity: Capacity) -> Self {
        Self {
            view,
            selected: Vec::new(),
            capacity,
        }
    }

    /// Seeds the selection from stored ids.
    ///
    /// Ids not in view and duplicates are dropped; the rest are kept in the
    /// given order up to capacity.
    #[must_use]
    pub fn with_selected(mut self, ids: impl IntoIterator<Item = T::Id>) -> Self {
        for id in ids {
            if !self.capacity.has_room(self.selected.len()) {
                break;
            }
            if self.in_view(&id) && !self.is_selected(&id) {
                self.selected.push(id);
            }
        }
        self
    }

    /// Flips one item.
    pub fn toggle(&mut self, id: &T::Id) -> Toggle {
        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
            return Toggle::Deselected;
        }
        if self.can_select(id) {
            self.selected.push(id.clone());
            return Toggle::Selected;
        }
        Toggle::Ignored
    }

    /// Clears when everything is selected, otherwise selects the current view.
    ///
    /// "Everything" means every item in view, or the capacity is reached. When
    /// filling, items are taken in view order until the capacity is hit.
    pub fn toggle_all(&mut self) {
        if self.all_selected() {
            self.selected.clear();
            return;
        }
        for item in &self.view {
            if !self.capacity.has_room(self.selected.len()) {
                break;
            }
            let id = item.selection_id();
            if !self.selected.contains(id) {
                self.selected.push(id.clone());
            }
        }
    }

    /// Returns true if the view is non-empty and fully selected (or the set is full).
    #[must_use]
    pub fn all_selected(&self) -> bool {
        !self.view.is_empty()
            && (self.is_full()
                || self
                    .view
                    .iter()
                    .all(|item| self.selected.contains(item.selection_id())))
    }

    /// Returns true if `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: &T::Id) -> bool {
        self.selected.contains(id)
    }

    /// Returns true if toggling `id` on would succeed.
    #[must_use]
    pub fn can_select(&self, id: &T::Id) -> bool {
        !self.is_selected(id) && self.in_view(id) && self.capacity.has_room(self.selected.len())
    }

    /// Selected ids in selection order.
    #[must_use]
    pub fn selected_ids(&self) -> &[T::Id] {
        &self.selected
    }

    /// Selected items in view order.
    pub fn selected_items(&self) -> impl Iterator<Item = &T> {
        self.view
            .iter()
            .filter(|item| self.selected.contains(item.selection_id()))
    }

    /// Items currently in view.
    #[must_use]
    pub fn view(&self) -> &[T] {
        &self.view
    }

    /// Replaces the view. Selected ids are kept, even if no longer shown.
    pub fn set_view(&mut self, view: Vec<T>) {
        self.view = view;
    }

    /// Mutable access to the view for reordering. Ids must stay the same.
    pub(crate) fn view_mut(&mut self) -> &mut Vec<T> {
        &mut self.view
    }

    /// Deselects everything.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Number of selected ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Returns true if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Returns the capacity.
    #[must_use]
    pub const fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Remaining budget, `None` when unbounded.
    #[must_use]
    pub fn remaining(&self) -> Option<usize> {
        match self.capacity {
            Capacity::Bounded(max) => Some(max.saturating_sub(self.selected.len())),
            Capacity::Unbounded => None,
        }
    }

    /// Returns true if no more items can be selected.
    #[must_use]
    pub fn is_full(&self) -> bool {
        !self.capacity.has_room(self.selected.len())
    }

    fn in_view(&self, id: &T::Id) -> bool {
        self.view.iter().any(|item| item.selection_id() == id)
    }
}
