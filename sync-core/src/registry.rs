//! Observer registry for snapshot subscribers.
//!
//! Subscribers are keyed by a monotonically assigned [`SubscriberId`] and
//! kept in registration order. Each entry has a [`SubscriberKind`]:
//! listeners only receive notifications, pollers additionally keep the
//! polling loop alive. The registry reports when the first poller joins
//! and when the last one leaves; the client starts the loop on the former
//! and stops it on the latter. The loop stops exactly when no poller is
//! registered.

use std::collections::BTreeMap;
use std::fmt;

/// Handle identifying one registered subscriber.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Get the numeric value of this id.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriberId({})", self.0)
    }
}

/// Role of a registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberKind {
    /// Receives change notifications only.
    Listener,
    /// Receives change notifications and keeps polling running.
    Poller,
}

/// Result of [`SubscriberRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// Handle for later removal.
    pub id: SubscriberId,
    /// This is the only subscriber of its kind.
    pub first_of_kind: bool,
}

/// Result of [`SubscriberRegistry::unregister`].
#[derive(Debug)]
pub struct Unregistration<F> {
    /// The removed subscriber.
    pub subscriber: F,
    /// Kind the subscriber was registered with.
    pub kind: SubscriberKind,
    /// No subscriber of this kind remains.
    pub last_of_kind: bool,
}

/// Ordered map from subscriber handle to callback.
#[derive(Debug)]
pub struct SubscriberRegistry<F> {
    next_id: u64,
    entries: BTreeMap<SubscriberId, (SubscriberKind, F)>,
}

impl<F> SubscriberRegistry<F> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entries: BTreeMap::new(),
        }
    }

    /// Add a subscriber.
    pub fn register(&mut self, kind: SubscriberKind, subscriber: F) -> Registration {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, (kind, subscriber));
        Registration {
            id,
            first_of_kind: self.count(kind) == 1,
        }
    }

    /// Remove a subscriber. Returns `None` for an unknown or already
    /// removed id.
    pub fn unregister(&mut self, id: SubscriberId) -> Option<Unregistration<F>> {
        let (kind, subscriber) = self.entries.remove(&id)?;
        Some(Unregistration {
            subscriber,
            kind,
            last_of_kind: self.count(kind) == 0,
        })
    }

    /// Kind of a registered subscriber.
    pub fn kind_of(&self, id: SubscriberId) -> Option<SubscriberKind> {
        self.entries.get(&id).map(|(kind, _)| *kind)
    }

    /// Number of subscribers of one kind.
    pub fn count(&self, kind: SubscriberKind) -> usize {
        self.entries.values().filter(|(k, _)| *k == kind).count()
    }

    /// Total number of subscribers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All subscribers in registration order.
    pub fn subscribers(&self) -> impl Iterator<Item = &F> {
        self.entries.values().map(|(_, subscriber)| subscriber)
    }
}

impl<F> Default for SubscriberRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_ordered() {
        let mut registry = SubscriberRegistry::new();
        let a = registry.register(SubscriberKind::Listener, "a").id;
        let b = registry.register(SubscriberKind::Poller, "b").id;
        let c = registry.register(SubscriberKind::Listener, "c").id;

        assert!(a < b && b < c);
        let order: Vec<_> = registry.subscribers().copied().collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut registry = SubscriberRegistry::new();
        let a = registry.register(SubscriberKind::Listener, 1).id;
        registry.unregister(a);
        let b = registry.register(SubscriberKind::Listener, 2).id;
        assert_ne!(a, b);
    }

    #[test]
    fn first_and_last_poller_are_reported() {
        let mut registry = SubscriberRegistry::new();

        let listener = registry.register(SubscriberKind::Listener, ());
        assert!(listener.first_of_kind);

        let first = registry.register(SubscriberKind::Poller, ());
        assert!(first.first_of_kind);
        let second = registry.register(SubscriberKind::Poller, ());
        assert!(!second.first_of_kind);

        let removed = registry.unregister(first.id).unwrap();
        assert_eq!(removed.kind, SubscriberKind::Poller);
        assert!(!removed.last_of_kind);

        let removed = registry.unregister(second.id).unwrap();
        assert!(removed.last_of_kind);

        // Listener is unaffected by poller bookkeeping
        assert_eq!(registry.count(SubscriberKind::Listener), 1);
        assert_eq!(registry.count(SubscriberKind::Poller), 0);
    }

    #[test]
    fn unregister_unknown_is_none() {
        let mut registry: SubscriberRegistry<()> = SubscriberRegistry::new();
        let id = registry.register(SubscriberKind::Poller, ()).id;
        assert!(registry.unregister(id).is_some());
        assert!(registry.unregister(id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn kind_of_reports_registration_kind() {
        let mut registry = SubscriberRegistry::new();
        let id = registry.register(SubscriberKind::Poller, ()).id;
        assert_eq!(registry.kind_of(id), Some(SubscriberKind::Poller));
        registry.unregister(id);
        assert_eq!(registry.kind_of(id), None);
    }
}
