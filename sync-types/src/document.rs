//! JSON envelope of the remote document store.
//!
//! The store hosts documents made of named files. Vigil tracks exactly one
//! file per document; its `content` is the JSON text of a [`Collection`].
//!
//! ```text
//! GET   /documents/{id}  -> { "updated_at": "...", "files": { "<name>": { "content": "<json>" } } }
//! PATCH /documents/{id}  <- { "files": { "<name>": { "content": "<json>" } } }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Collection, Revision, TypesError};

/// A document as returned by the store on read (and on a successful write).
///
/// Unknown fields are ignored so the store may return richer metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDocument {
    /// Last-modified marker
    pub updated_at: Revision,
    /// Files keyed by name
    #[serde(default)]
    pub files: BTreeMap<String, DocumentFile>,
}

/// One file of a remote document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentFile {
    /// File text. The store may omit it or send null for empty files.
    #[serde(default)]
    pub content: Option<String>,
}

impl RemoteDocument {
    /// Content of a named file, if the file exists and has content.
    pub fn file_content(&self, name: &str) -> Option<&str> {
        self.files.get(name).and_then(|file| file.content.as_deref())
    }
}

/// Request body replacing the content of files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPatch {
    /// Files to overwrite, keyed by name
    pub files: BTreeMap<String, FilePatch>,
}

/// New content for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePatch {
    /// Full replacement text
    pub content: String,
}

impl DocumentPatch {
    /// Patch replacing a single file with the encoded collection.
    pub fn replace_file(name: &str, items: &Collection) -> Result<Self, TypesError> {
        let mut files = BTreeMap::new();
        files.insert(
            name.to_string(),
            FilePatch {
                content: items.to_content()?,
            },
        );
        Ok(Self { files })
    }
}
