//! Error types for sync-core.

use thiserror::Error;

/// Errors raised by pure sync logic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A position that cannot be stored as JSON.
    #[error("invalid position ({x}, {y}): coordinates must be finite")]
    InvalidPosition {
        /// Requested x.
        x: f64,
        /// Requested y.
        y: f64,
    },
}
