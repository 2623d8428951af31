//! Client errors.

use sync_core::CoreError;
use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by [`SyncEngine`](crate::SyncEngine) mutations.
///
/// None of these is fatal: the engine stays usable after any of them.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The mutation was rejected before touching any state.
    #[error("invalid mutation: {0}")]
    InvalidMutation(#[from] CoreError),

    /// The store refused the operation before any local change was made.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The write failed; local state was replaced by the remote document.
    #[error("write failed, local changes rolled back: {source}")]
    RolledBack {
        /// Failure of the read-modify-write.
        source: StoreError,
    },

    /// The write failed and the remote document could not be re-read, so
    /// local state still shows the optimistic change.
    #[error("write failed and remote state is unknown: {source} (re-fetch: {refetch})")]
    Diverged {
        /// Failure of the read-modify-write.
        source: StoreError,
        /// Failure of the recovery fetch.
        refetch: StoreError,
    },
}

impl ClientError {
    /// Check if local state may no longer match the remote document.
    pub fn is_persistent_failure(&self) -> bool {
        matches!(self, Self::Diverged { .. })
    }

    /// The underlying store error, if any.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::InvalidMutation(_) => None,
            Self::Store(source) | Self::RolledBack { source } | Self::Diverged { source, .. } => {
                Some(source)
            }
        }
    }
}
