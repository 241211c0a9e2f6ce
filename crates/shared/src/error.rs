//! Error categories shared by every crate.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Error categories the dashboard reports.
///
/// None of them is fatal: the dashboard renders with whatever data it has.
#[derive(Debug, Error)]
pub enum AppError {
    /// A collaborator (rate source, catalog, preferences) could not be reached.
    #[error("Temporarily unavailable: {0}")]
    TransientFetch(String),

    /// A preference write was rejected or did not complete.
    #[error("Could not save: {0}")]
    Persistence(String),

    /// Input rejected before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Code shown alongside user-facing notices.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::TransientFetch(_) => "TRANSIENT_FETCH_FAILURE",
            Self::Persistence(_) => "PERSISTENCE_FAILURE",
            Self::Validation(_) => "VALIDATION_FAILURE",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Returns true if the user can resolve the error by resubmitting.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientFetch(_) | Self::Persistence(_))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
