//! # sync-core
//!
//! Pure logic for Vigil sync (no I/O, instant tests).
//!
//! This crate implements the local state, mutation transforms, the
//! mutation gate and the polling state machine without any network I/O,
//! enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! Modules here take input and produce output without side effects. The
//! actual I/O (fetching and patching the remote document, timers) is
//! performed by `sync-client`, which interprets the actions produced by the
//! polling state machine and drives the read-modify-write protocol.
//!
//! The one exception is [`MutationGate`], a pair of atomics shared between
//! the mutation path and the polling task.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod error;
pub mod gate;
pub mod mutation;
pub mod poll;
pub mod registry;

pub use cache::{LocalStateCache, PendingTicket};
pub use error::CoreError;
pub use gate::{Epoch, MutationGate, MutationGuard};
pub use mutation::{Mutation, MutationOutcome};
pub use poll::{DiscardReason, PollAction, PollEvent, PollState};
pub use registry::{
    Registration, SubscriberId, SubscriberKind, SubscriberRegistry, Unregistration,
};
