//! Identity and ordering types for Vigil.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an item within the shared collection.
///
/// Assigned by the client that creates the item as `max(existing) + 1`.
/// Serialized as a plain JSON number.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// The id handed out when the collection is empty.
    pub const FIRST: ItemId = ItemId(1);

    /// Create a new ItemId with the given value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this ItemId.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The id directly after this one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

/// Opaque revision marker of the remote document.
///
/// The store's `updated_at` value. Only compared for equality to answer
/// "did something change since I last looked"; never parsed or ordered.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    /// Create a revision from the store's token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Revision({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_serializes_as_number() {
        let json = serde_json::to_string(&ItemId::new(7)).unwrap();
        assert_eq!(json, "7");

        let id: ItemId = serde_json::from_str("42").unwrap();
        assert_eq!(id, ItemId::new(42));
    }

    #[test]
    fn item_id_ordering_and_next() {
        assert!(ItemId::new(1) < ItemId::new(2));
        assert_eq!(ItemId::new(4).next(), ItemId::new(5));
        assert_eq!(ItemId::new(u64::MAX).next(), ItemId::new(u64::MAX));
    }

    #[test]
    fn revision_is_opaque_string() {
        let rev: Revision = serde_json::from_str("\"2024-05-01T10:00:00Z\"").unwrap();
        assert_eq!(rev.as_str(), "2024-05-01T10:00:00Z");
        assert_eq!(rev, Revision::new("2024-05-01T10:00:00Z"));
        assert_ne!(rev, Revision::new("2024-05-01T10:00:01Z"));
    }
}
