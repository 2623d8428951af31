//! The shared state: items and the ordered collection holding them.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{ItemId, TypesError};

/// One entry of the shared document: a positioned, named item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique within one collection
    pub id: ItemId,
    /// Horizontal position
    pub x: f64,
    /// Vertical position
    pub y: f64,
    /// Display label (may be empty)
    #[serde(default)]
    pub name: String,
}

impl Item {
    /// Create a new item.
    pub fn new(id: ItemId, x: f64, y: f64, name: impl Into<String>) -> Self {
        Self {
            id,
            x,
            y,
            name: name.into(),
        }
    }
}

/// Ordered sequence of items, persisted wholesale as a JSON array.
///
/// Insertion order is preserved for display but carries no other meaning.
/// Ids are unique: constructing or decoding a collection keeps the first
/// item for any repeated id.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Collection(Vec<Item>);

impl Collection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a collection from items, dropping later duplicates of an id.
    pub fn from_items(items: Vec<Item>) -> Self {
        let mut collection = Self(Vec::with_capacity(items.len()));
        for item in items {
            collection.push(item);
        }
        collection
    }

    /// Decode the tracked file's content.
    ///
    /// Blank content is an empty collection (the document has no data yet).
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::MalformedDocument`] if the content is not a JSON
    /// array of items.
    pub fn from_content(content: &str) -> Result<Self, TypesError> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        serde_json::from_str(content).map_err(|e| TypesError::MalformedDocument(e.to_string()))
    }

    /// Encode as the JSON text stored in the tracked file.
    pub fn to_content(&self) -> Result<String, TypesError> {
        serde_json::to_string(self).map_err(TypesError::Serialization)
    }

    /// All items in display order.
    pub fn items(&self) -> &[Item] {
        &self.0
    }

    /// Iterate over items in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.0.iter()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the collection holds no items.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up an item by id.
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.0.iter().find(|item| item.id == id)
    }

    /// Look up an item by id for modification.
    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.0.iter_mut().find(|item| item.id == id)
    }

    /// Check if an item with this id exists.
    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Highest id present, if any.
    pub fn max_id(&self) -> Option<ItemId> {
        self.0.iter().map(|item| item.id).max()
    }

    /// The id a newly created item receives: `max(ids) + 1`, or 1 when empty.
    pub fn next_id(&self) -> ItemId {
        self.max_id().map(|id| id.next()).unwrap_or(ItemId::FIRST)
    }

    /// Append an item. Returns false (and leaves the collection unchanged)
    /// if the id is already taken.
    pub fn push(&mut self, item: Item) -> bool {
        if self.contains(item.id) {
            return false;
        }
        self.0.push(item);
        true
    }

    /// Remove an item by id, returning it if it was present.
    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let index = self.0.iter().position(|item| item.id == id)?;
        Some(self.0.remove(index))
    }

    /// Consume the collection, returning its items.
    pub fn into_items(self) -> Vec<Item> {
        self.0
    }
}

impl From<Vec<Item>> for Collection {
    fn from(items: Vec<Item>) -> Self {
        Self::from_items(items)
    }
}

impl<'de> Deserialize<'de> for Collection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Item>::deserialize(deserializer).map(Self::from_items)
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
