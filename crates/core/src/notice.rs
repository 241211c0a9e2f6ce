//! User-facing notices for degraded fetches and failed writes.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DashboardError;

/// Notice category, mirroring [`DashboardError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// Data could not be fetched; the dashboard shows what it has.
    Transient,
    /// A write failed; the user may retry.
    Persistence,
    /// Input was rejected.
    Validation,
}

impl From<&DashboardError> for NoticeKind {
    fn from(err: &DashboardError) -> Self {
        match err {
            DashboardError::TransientFetch(_) => Self::Transient,
            DashboardError::Persistence(_) => Self::Persistence,
            DashboardError::Validation(_) => Self::Validation,
        }
    }
}

/// One dismissible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    /// Notice key.
    pub id: Uuid,
    /// Category.
    pub kind: NoticeKind,
    /// Text shown to the user.
    pub message: String,
    /// When it was raised.
    pub raised_at: DateTime<Utc>,
    /// When it disappears on its own; `None` stays until dismissed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Failed write the notice refers to, for retry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_seq: Option<u64>,
}

impl Notice {
    /// Returns true if the notice is still shown at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires| now < expires)
    }
}

/// Notices raised during a session.
///
/// Transient and validation notices expire after the configured TTL.
/// Persistence notices stay until dismissed or their write is retried.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    ttl: TimeDelta,
    notices: Vec<Notice>,
}

impl NoticeBoard {
    /// Default time a notice stays on screen.
    pub const DEFAULT_TTL_SECS: u64 = 6;

    /// Creates an empty board.
    #[must_use]
    pub const fn new(ttl: TimeDelta) -> Self {
        Self {
            ttl,
            notices: Vec::new(),
        }
    }

    /// Creates an empty board with a TTL in seconds.
    #[must_use]
    pub fn with_ttl_secs(secs: u64) -> Self {
        let ttl = i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        Self::new(ttl)
    }

    /// Raises a notice now.
    pub fn raise(&mut self, kind: NoticeKind, message: impl Into<String>) -> &Notice {
        self.raise_at(kind, message, None, Utc::now())
    }

    /// Raises a notice for an error.
    pub fn raise_error(&mut self, err: &DashboardError) -> &Notice {
        self.raise_at(err.into(), err.to_string(), None, Utc::now())
    }

    /// Raises a persistence notice tied to a failed write.
    pub fn raise_for_intent(&mut self, seq: u64, err: &DashboardError) -> &Notice {
        self.raise_at(err.into(), err.to_string(), Some(seq), Utc::now())
    }

    /// Raises a notice at a given instant.
    pub fn raise_at(
        &mut self,
        kind: NoticeKind,
        message: impl Into<String>,
        intent_seq: Option<u64>,
        now: DateTime<Utc>,
    ) -> &Notice {
        let expires_at = match kind {
            NoticeKind::Persistence => None,
            NoticeKind::Transient | NoticeKind::Validation => now.checked_add_signed(self.ttl),
        };
        let index = self.notices.len();
        self.notices.push(Notice {
            id: Uuid::now_v7(),
            kind,
            message: message.into(),
            raised_at: now,
            expires_at,
            intent_seq,
        });
        &self.notices[index]
    }

    /// Removes a notice. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.notices.len();
        self.notices.retain(|notice| notice.id != id);
        self.notices.len() != before
    }

    /// Removes notices about write `seq`.
    pub fn dismiss_intent(&mut self, seq: u64) {
        self.notices.retain(|notice| notice.intent_seq != Some(seq));
    }

    /// Notices still shown at `now`, oldest first.
    pub fn active(&self, now: DateTime<Utc>) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(move |notice| notice.is_active(now))
    }

    /// Drops expired notices and returns how many were removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.notices.len();
        self.notices.retain(|notice| notice.is_active(now));
        before - self.notices.len()
    }

    /// Every notice, including expired ones not yet purged.
    #[must_use]
    pub fn all(&self) -> &[Notice] {
        &self.notices
    }

    /// Number of notices held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notices.len()
    }

    /// Returns true if no notice is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::with_ttl_secs(Self::DEFAULT_TTL_SECS)
    }
}
