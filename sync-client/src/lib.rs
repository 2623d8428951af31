//! # sync-client
//!
//! Client library for Vigil shared-document sync.
//!
//! This is the main library that applications use to read, edit and watch
//! one JSON collection hosted in a remote document store.
//!
//! ## Features
//!
//! - **Optimistic edits**: mutations show up locally before the round trip
//! - **Read-modify-write**: every write merges onto the latest remote state
//! - **Rollback**: a failed write resets local state to the remote document
//! - **Polling**: remote changes from other clients are fanned out to subscribers
//! - **Store Abstraction**: Pluggable store layer (HTTP, in-memory)
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sync_client::{HttpStore, StoreConfig, SyncEngine, DEFAULT_POLL_INTERVAL};
//!
//! let config = StoreConfig::new("3f1a9c").with_token(token);
//! let engine = Arc::new(SyncEngine::new(HttpStore::new(config)?));
//! engine.load().await;
//!
//! engine.add(12.0, 40.0, "Ada").await?;
//! engine.start_polling(|items| render(items), DEFAULT_POLL_INTERVAL);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod store;

pub use config::{
    StoreConfig, DEFAULT_ENDPOINT, DEFAULT_FILE_NAME, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT,
    DEFAULT_USER_AGENT,
};
pub use engine::{Callback, LoadReport, PollOutcome, SyncEngine, SyncStatus};
pub use error::ClientError;
pub use store::{DocumentStore, HttpStore, MemoryStore, RemoteSnapshot, StoreBlock, StoreError};

// Re-exported so callers need not depend on the inner crates directly.
pub use sync_core::{DiscardReason, Mutation, MutationOutcome, SubscriberId};
pub use sync_types::{Collection, Item, ItemId, Revision};
