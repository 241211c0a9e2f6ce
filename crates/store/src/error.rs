//! Adapter errors and their mapping onto the dashboard taxonomy.

use dashbank_core::DashboardError;
use thiserror::Error;

/// Errors raised by the store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport failure or timeout.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("{url} returned {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected payload from {url}: {message}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Decoder message.
        message: String,
    },

    /// The configured base URL cannot carry path segments.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Failure injected into the in-memory store.
    #[error("Injected failure: {0}")]
    Injected(String),
}

impl StoreError {
    /// Maps a failed read onto `DashboardError::TransientFetch`.
    #[must_use]
    pub fn into_fetch(self) -> DashboardError {
        DashboardError::TransientFetch(self.to_string())
    }

    /// Maps a failed write onto `DashboardError::Persistence`.
    #[must_use]
    pub fn into_write(self) -> DashboardError {
        DashboardError::Persistence(self.to_string())
    }

    /// Returns true for a 404 answer.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}
