//! Error types for Vigil data types.

use thiserror::Error;

/// Errors that can occur while encoding or decoding shared state.
#[derive(Debug, Error)]
pub enum TypesError {
    /// File content is present but is not a valid item array
    #[error("malformed document content: {0}")]
    MalformedDocument(String),

    /// JSON serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),
}
