//! Polling state machine for Vigil.
//!
//! This module provides a pure, side-effect-free state machine for one
//! polling cycle. The state machine takes events as input and produces a
//! new state plus a list of actions to execute.
//!
//! The actual I/O (fetching the document, replacing the cache, calling
//! subscribers) is performed by sync-client, not by this module.
//!
//! ```text
//! Idle --tick--> Polling --fetched, changed, quiet--> Applying --applied--> Idle
//!                   |
//!                   +--failed / unchanged / mutating / stopped--> Idle
//! ```

/// Polling cycle state - NO I/O, just state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    /// Waiting for the next tick.
    #[default]
    Idle,
    /// A fetch of the remote document is outstanding.
    Polling,
    /// A changed remote snapshot is being written into the cache.
    Applying,
}

impl PollState {
    /// Create a state machine in the Idle state.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (sync-client)
    /// is responsible for executing the returned actions.
    pub fn on_event(self, event: PollEvent) -> (Self, Vec<PollAction>) {
        match (self, event) {
            // From Idle
            (Self::Idle, PollEvent::TickElapsed) => (Self::Polling, vec![PollAction::FetchDocument]),

            // From Polling
            (Self::Polling, PollEvent::FetchSucceeded { stopped: true, .. }) => (
                Self::Idle,
                vec![PollAction::Discard {
                    reason: DiscardReason::Stopped,
                }],
            ),
            (
                Self::Polling,
                PollEvent::FetchSucceeded {
                    gate_quiet: false, ..
                },
            ) => (
                Self::Idle,
                vec![PollAction::Discard {
                    reason: DiscardReason::MutationInFlight,
                }],
            ),
            (Self::Polling, PollEvent::FetchSucceeded { changed: false, .. }) => (
                Self::Idle,
                vec![PollAction::Discard {
                    reason: DiscardReason::Unchanged,
                }],
            ),
            (Self::Polling, PollEvent::FetchSucceeded { .. }) => {
                (Self::Applying, vec![PollAction::ApplySnapshot])
            }
            (Self::Polling, PollEvent::FetchFailed { error }) => {
                (Self::Idle, vec![PollAction::LogFailure { error }])
            }

            // From Applying
            (Self::Applying, PollEvent::ApplyCompleted) => {
                (Self::Idle, vec![PollAction::NotifySubscribers])
            }

            // Invalid transitions (e.g. a tick while a fetch is outstanding) - stay put
            (state, _) => (state, vec![]),
        }
    }

    /// Check if a fetch or apply is in progress.
    pub fn is_busy(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Events that can occur during a polling cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// The polling interval elapsed.
    TickElapsed,
    /// The remote document was fetched.
    FetchSucceeded {
        /// The fetched revision differs from the last observed one.
        changed: bool,
        /// No mutation was in flight or began while fetching.
        gate_quiet: bool,
        /// Polling was stopped while the fetch was outstanding.
        stopped: bool,
    },
    /// The fetch failed.
    FetchFailed {
        /// Error message describing the failure.
        error: String,
    },
    /// The snapshot has been written into the cache.
    ApplyCompleted,
}

/// Actions to be executed by the sync-client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollAction {
    /// Fetch the remote document.
    FetchDocument,
    /// Drop the fetched result without touching local state.
    Discard {
        /// Why the result was dropped.
        reason: DiscardReason,
    },
    /// Replace the cache with the fetched collection and record its revision.
    ApplySnapshot,
    /// Fan the new snapshot out to subscribers.
    NotifySubscribers,
    /// Record a failed poll. Never surfaced to the user.
    LogFailure {
        /// Error message describing the failure.
        error: String,
    },
}

/// Why a fetched snapshot was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The revision matches the last one observed.
    Unchanged,
    /// A local mutation was in flight; its own read-modify-write covers
    /// the remote state.
    MutationInFlight,
    /// Polling was stopped before the fetch returned.
    Stopped,
}
