//! Local state cache: the collection the presentation layer renders.
//!
//! The cache is the single in-process source of truth for rendering. It is
//! replaced wholesale after a successful write or a poll-detected remote
//! change, and edited in place by optimistic mutations.
//!
//! Optimistic edits stay pending until their write settles. Every replace
//! re-applies the pending edits on top of the new base, in the order they
//! were made, so one mutation settling never hides another that is still
//! in flight.
//!
//! The id counter is derived from the contents on every replace
//! (`max(ids) + 1`, or 1 when empty). It is never persisted, so a removed
//! maximum id does not leave a stale counter behind.

use sync_types::{Collection, ItemId};

use crate::{CoreError, Mutation, MutationOutcome};

/// Identifies an optimistic edit that has not settled yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingTicket(u64);

/// In-memory copy of the shared collection plus its derived id counter.
#[derive(Debug, Clone)]
pub struct LocalStateCache {
    items: Collection,
    next_id: ItemId,
    pending: Vec<(PendingTicket, Mutation)>,
    next_ticket: u64,
}

impl LocalStateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::with_items(Collection::new())
    }

    /// Create a cache holding the given collection.
    pub fn with_items(items: Collection) -> Self {
        let next_id = items.next_id();
        Self {
            items,
            next_id,
            pending: Vec::new(),
            next_ticket: 1,
        }
    }

    /// Current state for rendering.
    pub fn snapshot(&self) -> Collection {
        self.items.clone()
    }

    /// Borrow the current state without cloning.
    pub fn items(&self) -> &Collection {
        &self.items
    }

    /// Swap in a new base collection, re-apply pending edits on top and
    /// recompute the id counter.
    pub fn replace(&mut self, items: Collection) {
        self.items = items;
        for (_, mutation) in &self.pending {
            mutation.apply(&mut self.items);
        }
        self.next_id = self.items.next_id();
    }

    /// Apply a local edit immediately, before any round trip.
    ///
    /// The edit stays pending until [`settle`](Self::settle) or
    /// [`forget`](Self::forget) is called with the returned ticket.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation fails validation; the cache is left
    /// untouched.
    pub fn apply_optimistic(
        &mut self,
        mutation: &Mutation,
    ) -> Result<(PendingTicket, MutationOutcome), CoreError> {
        mutation.validate()?;
        let outcome = mutation.apply(&mut self.items);
        self.next_id = self.items.next_id();

        let ticket = PendingTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending.push((ticket, mutation.clone()));
        Ok((ticket, outcome))
    }

    /// Finish a pending edit with the remote state its write produced.
    ///
    /// `items` already contains the edit; the remaining pending edits are
    /// re-applied on top.
    pub fn settle(&mut self, ticket: PendingTicket, items: Collection) {
        self.forget(ticket);
        self.replace(items);
    }

    /// Drop a pending edit without touching the current state.
    ///
    /// Returns false if the ticket already settled.
    pub fn forget(&mut self, ticket: PendingTicket) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(pending, _)| *pending != ticket);
        self.pending.len() != before
    }

    /// Number of optimistic edits not yet settled.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// The id the next locally created item would receive.
    pub fn next_id(&self) -> ItemId {
        self.next_id
    }

    /// Number of cached items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cache holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for LocalStateCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_types::Item;

    fn item(id: u64) -> Item {
        Item::new(ItemId::new(id), 0.0, 0.0, "")
    }

    #[test]
    fn starts_empty_with_first_id() {
        let cache = LocalStateCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.next_id(), ItemId::new(1));
    }

    #[test]
    fn replace_recomputes_counter() {
        let mut cache = LocalStateCache::new();
        cache.replace(Collection::from_items(vec![item(4), item(9)]));
        assert_eq!(cache.next_id(), ItemId::new(10));

        cache.replace(Collection::from_items(vec![item(2)]));
        assert_eq!(cache.next_id(), ItemId::new(3));

        cache.replace(Collection::new());
        assert_eq!(cache.next_id(), ItemId::new(1));
    }

    #[test]
    fn removing_max_then_adding_reuses_derived_counter() {
        let mut cache = LocalStateCache::with_items(Collection::from_items(vec![
            item(1),
            item(2),
            item(3),
        ]));

        cache
            .apply_optimistic(&Mutation::Remove { id: ItemId::new(3) })
            .unwrap();
        let (_, outcome) = cache
            .apply_optimistic(&Mutation::Add {
                x: 1.0,
                y: 1.0,
                name: "new".into(),
            })
            .unwrap();

        // max(remaining) + 1, not removed + 1
        assert_eq!(outcome, MutationOutcome::Added(ItemId::new(3)));
        assert_eq!(cache.next_id(), ItemId::new(4));
    }

    #[test]
    fn invalid_mutation_leaves_cache_untouched() {
        let mut cache = LocalStateCache::with_items(Collection::from_items(vec![item(1)]));
        let before = cache.snapshot();

        let result = cache.apply_optimistic(&Mutation::Move {
            id: ItemId::new(1),
            x: f64::NAN,
            y: 0.0,
        });

        assert!(result.is_err());
        assert_eq!(cache.snapshot(), before);
    }

    #[test]
    fn snapshot_is_detached_copy() {
        let mut cache = LocalStateCache::with_items(Collection::from_items(vec![item(1)]));
        let snapshot = cache.snapshot();

        cache
            .apply_optimistic(&Mutation::Remove { id: ItemId::new(1) })
            .unwrap();

        assert_eq!(snapshot.len(), 1);
        assert!(cache.is_empty());
    }

    fn rename(id: u64, name: &str) -> Mutation {
        Mutation::Rename {
            id: ItemId::new(id),
            name: name.into(),
        }
    }

    #[test]
    fn settling_one_edit_keeps_the_other_pending() {
        let mut cache = LocalStateCache::with_items(Collection::from_items(vec![item(1)]));

        let (first, _) = cache
            .apply_optimistic(&Mutation::Add {
                x: 0.0,
                y: 0.0,
                name: "first".into(),
            })
            .unwrap();
        let (_second, _) = cache.apply_optimistic(&rename(1, "second")).unwrap();
        assert_eq!(cache.pending(), 2);

        // The first write lands on a remote that knows nothing of the rename.
        let mut remote = Collection::from_items(vec![item(1)]);
        remote.push(Item::new(ItemId::new(2), 0.0, 0.0, "first"));
        cache.settle(first, remote);

        assert_eq!(cache.pending(), 1);
        assert_eq!(cache.items().get(ItemId::new(1)).unwrap().name, "second");
        assert_eq!(cache.items().get(ItemId::new(2)).unwrap().name, "first");
    }

    #[test]
    fn replace_reapplies_pending_edits_in_order() {
        let mut cache = LocalStateCache::new();
        cache.apply_optimistic(&rename(5, "a")).unwrap();
        cache.apply_optimistic(&rename(5, "b")).unwrap();

        cache.replace(Collection::from_items(vec![item(5)]));
        assert_eq!(cache.items().get(ItemId::new(5)).unwrap().name, "b");
        assert_eq!(cache.next_id(), ItemId::new(6));
    }

    #[test]
    fn forgotten_edit_is_not_reapplied() {
        let mut cache = LocalStateCache::with_items(Collection::from_items(vec![item(1)]));
        let (ticket, _) = cache.apply_optimistic(&rename(1, "local")).unwrap();

        assert!(cache.forget(ticket));
        assert!(!cache.forget(ticket));
        // The optimistic state itself stays until the next replace.
        assert_eq!(cache.items().get(ItemId::new(1)).unwrap().name, "local");

        cache.replace(Collection::from_items(vec![item(1)]));
        assert_eq!(cache.items().get(ItemId::new(1)).unwrap().name, "");
    }

    #[test]
    fn invalid_mutation_is_not_queued() {
        let mut cache = LocalStateCache::new();
        let result = cache.apply_optimistic(&Mutation::Add {
            x: f64::INFINITY,
            y: 0.0,
            name: String::new(),
        });
        assert!(result.is_err());
        assert_eq!(cache.pending(), 0);
    }
}
