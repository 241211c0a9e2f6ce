//! Optimistic write-through queue for module order changes.
//!
//! Every local change is applied immediately and recorded as an intent with a
//! monotonic sequence number. The session writes the intent, then reports the
//! outcome back by sequence. Failed intents stay queued until the user retries
//! them or a newer change makes them obsolete.

use dashbank_shared::types::ModuleId;
use serde::{Deserialize, Serialize};

use super::types::PreferredOrderEntry;
use crate::error::ValidationError;

/// What an intent writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    /// Drag reorder: ranks for the whole sequence.
    Reorder,
    /// Restore catalog ranks for the whole sequence.
    Reset,
    /// Selected modules and their ranks among the selection.
    Save,
}

impl IntentKind {
    /// Returns true if acknowledging `self` makes an older `other` obsolete.
    ///
    /// A save rewrites both the selection and the ranks, so it obsoletes
    /// everything. Reorder and reset only rewrite ranks, so an older save
    /// still carries a selection nobody else wrote.
    #[must_use]
    pub const fn supersedes(self, other: Self) -> bool {
        match self {
            Self::Save => true,
            Self::Reorder | Self::Reset => matches!(other, Self::Reorder | Self::Reset),
        }
    }
}

/// Write status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum IntentStatus {
    /// Issued, no outcome yet.
    Pending,
    /// Written.
    Acknowledged,
    /// Rejected by the store.
    Failed {
        /// Store message.
        reason: String,
    },
}

/// One recorded change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIntent {
    /// Monotonic sequence number, starting at 1.
    pub seq: u64,
    /// What the intent writes.
    pub kind: IntentKind,
    /// Ranks to upsert.
    pub entries: Vec<PreferredOrderEntry>,
    /// Selected module ids; empty unless `kind` is `Save`.
    pub selected: Vec<ModuleId>,
    /// Current status.
    pub status: IntentStatus,
}

impl OrderIntent {
    /// Returns true if the last write attempt failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.status, IntentStatus::Failed { .. })
    }
}

/// Outstanding intents in issue order.
#[derive(Debug, Clone, Default)]
pub struct IntentQueue {
    last_seq: u64,
    intents: Vec<OrderIntent>,
}

impl IntentQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_seq: 0,
            intents: Vec::new(),
        }
    }

    /// Records a new pending intent and returns a copy for the writer.
    pub fn issue(
        &mut self,
        kind: IntentKind,
        entries: Vec<PreferredOrderEntry>,
        selected: Vec<ModuleId>,
    ) -> OrderIntent {
        self.last_seq += 1;
        let intent = OrderIntent {
            seq: self.last_seq,
            kind,
            entries,
            selected,
            status: IntentStatus::Pending,
        };
        self.intents.push(intent.clone());
        intent
    }

    /// Marks `seq` written.
    ///
    /// The intent leaves the queue together with every older intent it
    /// supersedes. Returns the seqs of those older intents.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownIntent` if `seq` is not queued.
    pub fn acknowledge(&mut self, seq: u64) -> Result<Vec<u64>, ValidationError> {
        let kind = self.get(seq).ok_or(ValidationError::UnknownIntent(seq))?.kind;
        let (kept, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.intents)
            .into_iter()
            .partition(|intent| {
                intent.seq > seq || (intent.seq < seq && !kind.supersedes(intent.kind))
            });
        self.intents = kept;
        Ok(removed
            .into_iter()
            .map(|intent| intent.seq)
            .filter(|removed| *removed != seq)
            .collect())
    }

    /// Marks `seq` failed with the store's reason.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownIntent` if `seq` is not queued.
    pub fn fail(&mut self, seq: u64, reason: impl Into<String>) -> Result<(), ValidationError> {
        let intent = self
            .intents
            .iter_mut()
            .find(|intent| intent.seq == seq)
            .ok_or(ValidationError::UnknownIntent(seq))?;
        intent.status = IntentStatus::Failed {
            reason: reason.into(),
        };
        Ok(())
    }

    /// Puts a failed intent back to pending and returns it for resubmission.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownIntent` if `seq` is not a failed
    /// intent, or `ValidationError::StaleIntent` if a newer intent would be
    /// overwritten by it.
    pub fn retry(&mut self, seq: u64) -> Result<OrderIntent, ValidationError> {
        let kind = match self.get(seq) {
            Some(intent) if intent.is_failed() => intent.kind,
            _ => return Err(ValidationError::UnknownIntent(seq)),
        };

        if self.is_stale(seq, kind) {
            return Err(ValidationError::StaleIntent(seq));
        }

        let intent = self
            .intents
            .iter_mut()
            .find(|intent| intent.seq == seq)
            .ok_or(ValidationError::UnknownIntent(seq))?;
        intent.status = IntentStatus::Pending;
        Ok(intent.clone())
    }

    /// Drops a failed intent the user gave up on.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownIntent` if `seq` is not queued.
    pub fn discard(&mut self, seq: u64) -> Result<OrderIntent, ValidationError> {
        let pos = self
            .intents
            .iter()
            .position(|intent| intent.seq == seq)
            .ok_or(ValidationError::UnknownIntent(seq))?;
        Ok(self.intents.remove(pos))
    }

    /// Looks up an intent by sequence.
    #[must_use]
    pub fn get(&self, seq: u64) -> Option<&OrderIntent> {
        self.intents.iter().find(|intent| intent.seq == seq)
    }

    /// Failed intents, oldest first.
    pub fn failed(&self) -> impl Iterator<Item = &OrderIntent> {
        self.intents.iter().filter(|intent| intent.is_failed())
    }

    /// Sequence number of the most recently issued intent, 0 if none.
    #[must_use]
    pub const fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// Number of queued intents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.intents.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    fn is_stale(&self, seq: u64, kind: IntentKind) -> bool {
        self.intents
            .iter()
            .any(|newer| newer.seq > seq && newer.kind.supersedes(kind))
    }
}
