//! Dashboard error taxonomy.
//!
//! None of these errors is fatal: the session degrades and keeps rendering.

use dashbank_shared::AppError;
use dashbank_shared::types::{ItemId, ModuleId};
use thiserror::Error;

/// Errors raised by the dashboard core and its ports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    /// A collaborator could not be reached; the caller degrades to empty or default state.
    #[error("Temporarily unavailable: {0}")]
    TransientFetch(String),

    /// A write was rejected; in-memory state is kept and the user may retry.
    #[error("Could not save: {0}")]
    Persistence(String),

    /// Rejected before any network call; nothing was mutated.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Input rejected before any state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Save attempted with nothing selected.
    #[error("Select at least one item before saving")]
    NothingSelected,

    /// Selecting one more item would exceed the module's capacity.
    #[error("At most {capacity} items can be selected")]
    CapacityExceeded {
        /// Module capacity.
        capacity: usize,
    },

    /// Module id not present in the current sequence.
    #[error("Unknown module: {0}")]
    UnknownModule(ModuleId),

    /// Item id not eligible for the module.
    #[error("Item {0} is not available in this module")]
    UnknownItem(ItemId),

    /// No intent with this sequence number is awaiting retry.
    #[error("No failed save with sequence {0}")]
    UnknownIntent(u64),

    /// A newer change was issued after this one; retrying would overwrite it.
    #[error("Save {0} was superseded by a newer change")]
    StaleIntent(u64),

    /// The visibility editor was already saved and closed.
    #[error("Module editor is closed")]
    EditorClosed,
}

impl DashboardError {
    /// Returns true for failures the user can resolve by resubmitting.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientFetch(_) | Self::Persistence(_))
    }
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::TransientFetch(msg) => Self::TransientFetch(msg),
            DashboardError::Persistence(msg) => Self::Persistence(msg),
            DashboardError::Validation(inner) => Self::Validation(inner.to_string()),
        }
    }
}
