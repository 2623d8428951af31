//! Local mutation intents and their transform over a collection.
//!
//! A [`Mutation`] is applied twice during one write: first optimistically to
//! the local cache, then again to the freshly fetched remote collection
//! (the merge step of read-modify-write). Both applications use
//! [`Mutation::apply`], so the two results only differ where the base
//! collections differ.

use sync_types::{Collection, Item, ItemId};

use crate::CoreError;

/// A single edit requested by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Create a new item. Its id is assigned from the collection it is
    /// applied to.
    Add {
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
        /// Label.
        name: String,
    },
    /// Change an item's label.
    Rename {
        /// Target item.
        id: ItemId,
        /// New label (may be empty).
        name: String,
    },
    /// Change an item's position.
    Move {
        /// Target item.
        id: ItemId,
        /// New horizontal position.
        x: f64,
        /// New vertical position.
        y: f64,
    },
    /// Delete an item.
    Remove {
        /// Target item.
        id: ItemId,
    },
}

/// What applying a mutation did to a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// A new item was appended with this id.
    Added(ItemId),
    /// An existing item changed.
    Updated(ItemId),
    /// The item was removed.
    Removed(ItemId),
    /// Nothing changed: the target is missing or already has the requested value.
    Unchanged(ItemId),
}

impl MutationOutcome {
    /// The item this outcome refers to.
    pub fn id(&self) -> ItemId {
        match self {
            Self::Added(id) | Self::Updated(id) | Self::Removed(id) | Self::Unchanged(id) => *id,
        }
    }

    /// Check if the collection was modified.
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged(_))
    }
}

impl Mutation {
    /// Check that the mutation can be persisted.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPosition`] for NaN or infinite coordinates,
    /// which JSON cannot represent.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::Add { x, y, .. } | Self::Move { x, y, .. } if !(x.is_finite() && y.is_finite()) => {
                Err(CoreError::InvalidPosition { x: *x, y: *y })
            }
            _ => Ok(()),
        }
    }

    /// The existing item this mutation targets (`None` for `Add`).
    pub fn target(&self) -> Option<ItemId> {
        match self {
            Self::Add { .. } => None,
            Self::Rename { id, .. } | Self::Move { id, .. } | Self::Remove { id } => Some(*id),
        }
    }

    /// Apply the transform in place.
    ///
    /// Operations on a missing id are no-ops reporting
    /// [`MutationOutcome::Unchanged`]; removing twice is never an error.
    pub fn apply(&self, items: &mut Collection) -> MutationOutcome {
        match self {
            Self::Add { x, y, name } => {
                let id = items.next_id();
                items.push(Item::new(id, *x, *y, name.clone()));
                MutationOutcome::Added(id)
            }
            Self::Rename { id, name } => match items.get_mut(*id) {
                Some(item) if item.name != *name => {
                    item.name = name.clone();
                    MutationOutcome::Updated(*id)
                }
                _ => MutationOutcome::Unchanged(*id),
            },
            Self::Move { id, x, y } => match items.get_mut(*id) {
                Some(item) if item.x != *x || item.y != *y => {
                    item.x = *x;
                    item.y = *y;
                    MutationOutcome::Updated(*id)
                }
                _ => MutationOutcome::Unchanged(*id),
            },
            Self::Remove { id } => match items.remove(*id) {
                Some(_) => MutationOutcome::Removed(*id),
                None => MutationOutcome::Unchanged(*id),
            },
        }
    }
}
