//! Mutation gate: keeps poll results from overwriting in-flight edits.
//!
//! Every read-modify-write holds a [`MutationGuard`] from before its
//! optimistic update until after local state is reconciled. The guard
//! releases on drop, so an early return, an error, a panic, or a dropped
//! future cannot leave the gate closed and starve polling.
//!
//! Besides the in-flight counter the gate keeps an epoch that advances on
//! every [`MutationGate::begin`]. A poll that records the epoch before its
//! fetch can tell, once the fetch returns, whether any mutation ran in the
//! meantime even if it already finished.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Opaque snapshot of the gate's epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch {
    counter: u64,
    busy: bool,
}

/// Process-scoped in-flight counter. Not persisted.
#[derive(Debug, Default)]
pub struct MutationGate {
    in_flight: AtomicUsize,
    epoch: AtomicU64,
}

impl MutationGate {
    /// Create an open gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a mutation as in flight until the returned guard is dropped.
    pub fn begin(&self) -> MutationGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        MutationGuard { gate: self }
    }

    /// Check if any mutation is in flight.
    pub fn is_mutating(&self) -> bool {
        self.in_flight() > 0
    }

    /// Number of mutations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Record the current epoch.
    pub fn epoch(&self) -> Epoch {
        // Counter first: a begin() racing this call shows up in one of the two.
        let counter = self.epoch.load(Ordering::SeqCst);
        Epoch {
            counter,
            busy: self.is_mutating(),
        }
    }

    /// True if no mutation was in flight when `epoch` was recorded, none is
    /// in flight now, and none began in between.
    pub fn is_quiet_since(&self, epoch: Epoch) -> bool {
        !epoch.busy && !self.is_mutating() && self.epoch.load(Ordering::SeqCst) == epoch.counter
    }
}

/// Holds the gate closed; releases on drop.
#[derive(Debug)]
#[must_use = "the gate reopens as soon as the guard is dropped"]
pub struct MutationGuard<'a> {
    gate: &'a MutationGate,
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
