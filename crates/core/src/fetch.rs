//! Last-request-wins gate for cancellable fetches.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

/// Result of a gated fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    /// Finished while still the newest request.
    Completed(T),
    /// A newer request started first; the result was dropped.
    Superseded,
}

impl<T> FetchOutcome<T> {
    /// Returns the value if the fetch completed.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Superseded => None,
        }
    }
}

#[derive(Debug, Default)]
struct GateState {
    generation: u64,
    token: CancellationToken,
}

/// Handle for one started request.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    token: CancellationToken,
}

impl FetchTicket {
    /// Generation number, starting at 1.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true once a newer request has started.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Cancels the previous request whenever a new one begins.
///
/// Cloning shares the gate.
#[derive(Debug, Clone, Default)]
pub struct FetchGate {
    state: Arc<Mutex<GateState>>,
}

impl FetchGate {
    /// Creates a gate with no request started.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a request, cancelling the one in flight.
    #[must_use]
    pub fn begin(&self) -> FetchTicket {
        let mut state = self.lock();
        state.token.cancel();
        state.generation += 1;
        state.token = CancellationToken::new();
        FetchTicket {
            generation: state.generation,
            token: state.token.clone(),
        }
    }

    /// Returns true if no newer request started after `ticket`.
    #[must_use]
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.lock().generation == ticket.generation
    }

    /// Cancels the request in flight without starting another.
    pub fn cancel(&self) {
        self.lock().token.cancel();
    }

    /// Runs `fut` as the newest request.
    ///
    /// Resolves to `Superseded` as soon as another request begins, without
    /// waiting for `fut` to finish.
    pub async fn run<F, T>(&self, fut: F) -> FetchOutcome<T>
    where
        F: Future<Output = T>,
    {
        let ticket = self.begin();

        let value = tokio::select! {
            biased;
            () = ticket.token.cancelled() => return FetchOutcome::Superseded,
            value = fut => value,
        };

        if self.is_current(&ticket) {
            FetchOutcome::Completed(value)
        } else {
            FetchOutcome::Superseded
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
