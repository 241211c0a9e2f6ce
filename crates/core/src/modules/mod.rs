//! Dashboard modules: catalog, ordering and per-module item visibility.
//!
//! # Modules
//!
//! - `types` - Catalog entries, stored ranks, roles
//! - `ordering` - Merge, sort, drag reorder and the session engine
//! - `intents` - Optimistic write-through queue
//! - `visibility` - Bounded item selection per module

pub mod intents;
pub mod ordering;
pub mod types;
pub mod visibility;

#[cfg(test)]
mod props;

pub use intents::{IntentKind, IntentQueue, IntentStatus, OrderIntent};
pub use ordering::{
    ModuleOrderingEngine, default_sequence, merge, move_module, order_entries, ordered_modules,
    renumber, reorder, selected_ranks, sort_modules,
};
pub use types::{ModuleDescriptor, ModuleType, PreferredOrderEntry, Role, SelectionPreference};
pub use visibility::{EditorState, ModuleVisibilityController, selection_set_for};
