//! Remote document store abstraction for Vigil.
//!
//! This module provides a pluggable store layer that abstracts the hosted
//! document API (HTTP for production, in-memory for testing).
//!
//! # Design
//!
//! The store trait is async and stateless from the caller's point of view:
//! - `fetch_document()` reads the tracked file and its revision marker
//! - `write_document()` replaces the tracked file wholesale
//! - `is_writable()` reports whether a credential is configured
//!
//! Malformed or absent file content is not an error: it decodes to an empty
//! collection and is logged, so a corrupted document never wedges a client.
//!
//! # Example
//!
//! ```ignore
//! let store = MemoryStore::new();
//! let remote = store.fetch_document().await?;
//! let revision = store.write_document(&remote.collection).await?;
//! ```

mod http;
mod memory;

pub use http::HttpStore;
pub use memory::{MemoryStore, StoreBlock};

use async_trait::async_trait;
use sync_types::{Collection, RemoteDocument, Revision};
use thiserror::Error;

/// Store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The request never produced a response (network, DNS, timeout).
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The store answered with a non-success status.
    #[error("remote rejected request (status {status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// A write was attempted without a credential.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// The response body is not a document envelope.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The collection could not be encoded for writing.
    #[error("encoding failed: {0}")]
    Encoding(String),
}

/// The tracked collection together with the revision it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSnapshot {
    /// Decoded items (empty when the file is absent or malformed).
    pub collection: Collection,
    /// The document's last-modified marker.
    pub revision: Revision,
}

/// Store trait for reading and writing the shared document.
///
/// Implementations handle the underlying API (hosted HTTP, in-memory, etc).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the current collection and revision.
    async fn fetch_document(&self) -> Result<RemoteSnapshot, StoreError>;

    /// Replace the tracked file with `items` and return the new revision.
    ///
    /// Fails with [`StoreError::NotConfigured`] without sending anything when
    /// the store is read-only.
    async fn write_document(&self, items: &Collection) -> Result<Revision, StoreError>;

    /// Check if writes can be attempted.
    fn is_writable(&self) -> bool;
}

/// Extract the tracked file from a document envelope.
pub(crate) fn decode_snapshot(document: RemoteDocument, file_name: &str) -> RemoteSnapshot {
    let collection = match document.file_content(file_name) {
        None => {
            tracing::debug!("Document has no content for {}, treating as empty", file_name);
            Collection::new()
        }
        Some(content) => match Collection::from_content(content) {
            Ok(collection) => collection,
            Err(e) => {
                tracing::warn!("Ignoring malformed content in {}: {}", file_name, e);
                Collection::new()
            }
        },
    };

    RemoteSnapshot {
        collection,
        revision: document.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use sync_types::{DocumentFile, ItemId};

    fn document(content: Option<&str>) -> RemoteDocument {
        let mut files = BTreeMap::new();
        files.insert(
            "candles.json".to_string(),
            DocumentFile {
                content: content.map(str::to_string),
            },
        );
        RemoteDocument {
            updated_at: Revision::new("r1"),
            files,
        }
    }

    #[test]
    fn decodes_tracked_file() {
        let snapshot = decode_snapshot(
            document(Some(r#"[{"id":2,"x":1.0,"y":2.0,"name":"a"}]"#)),
            "candles.json",
        );
        assert_eq!(snapshot.revision, Revision::new("r1"));
        assert!(snapshot.collection.contains(ItemId::new(2)));
    }

    #[test]
    fn absent_file_is_empty() {
        let snapshot = decode_snapshot(document(Some("[]")), "other.json");
        assert!(snapshot.collection.is_empty());

        let snapshot = decode_snapshot(document(None), "candles.json");
        assert!(snapshot.collection.is_empty());
    }

    #[test]
    fn malformed_content_is_empty() {
        let snapshot = decode_snapshot(document(Some("{\"not\":\"an array\"}")), "candles.json");
        assert!(snapshot.collection.is_empty());
        assert_eq!(snapshot.revision, Revision::new("r1"));
    }

    #[test]
    fn error_messages() {
        let err = StoreError::Rejected {
            status: 401,
            message: "Bad credentials".into(),
        };
        assert_eq!(
            err.to_string(),
            "remote rejected request (status 401): Bad credentials"
        );
        assert!(StoreError::NotConfigured("no token".into())
            .to_string()
            .starts_with("not configured"));
    }
}
