//! SyncEngine - the main interface for Vigil.
//!
//! This module provides [`SyncEngine`], the API the presentation layer uses
//! to read and edit the shared collection.
//!
//! # Architecture
//!
//! SyncEngine owns the local cache and the mutation gate (from sync-core)
//! and performs the actual I/O through the [`DocumentStore`] trait. Polling
//! runs through the pure poll state machine; the engine only executes the
//! actions it returns.
//!
//! ```text
//! Presentation → SyncEngine → DocumentStore → Network
//!                    ↓
//!               sync-core (cache, gate, poll state machine)
//! ```
//!
//! # Mutations
//!
//! Every mutation is applied to the cache at once, then persisted with a
//! read-modify-write: fetch the latest document, apply the same transform
//! to it, write the result. A failed write is rolled back by re-fetching
//! the remote document. The gate is held for the whole sequence so a poll
//! never replaces the cache with a snapshot that predates the write.
//!
//! Overlapping local mutations queue behind one write lock. Their
//! optimistic edits stay pending in the cache and are re-applied whenever
//! an earlier mutation settles, so none of them flickers back out of view.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sync_client::{MemoryStore, SyncEngine};
//!
//! let engine = Arc::new(SyncEngine::new(MemoryStore::new()));
//! engine.load().await;
//!
//! let id = engine.add(10.0, 20.0, "first").await?.id();
//! engine.rename(id, "renamed").await?;
//!
//! let poller = engine.start_polling(|items| println!("{} items", items.len()), interval);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, SystemTime};

use sync_core::{
    DiscardReason, LocalStateCache, Mutation, MutationGate, MutationOutcome, PendingTicket,
    PollAction, PollEvent, PollState, SubscriberId, SubscriberKind, SubscriberRegistry,
};
use sync_types::{Collection, ItemId, Revision};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::ClientError;
use crate::store::{DocumentStore, RemoteSnapshot, StoreError};

/// Snapshot callback shared by listeners and pollers.
pub type Callback = Arc<dyn Fn(&Collection) + Send + Sync>;

/// Result of one polling cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A changed remote snapshot replaced local state.
    Applied,
    /// The remote revision matches the last one observed.
    Unchanged,
    /// The fetched snapshot was dropped.
    Discarded(DiscardReason),
    /// The fetch failed; the next tick retries.
    Failed(StoreError),
}

/// Result of [`SyncEngine::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    /// Current local state after the load.
    pub items: Collection,
    /// Why the remote document could not be read, if it could not.
    pub warning: Option<StoreError>,
}

/// Observable sync state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    /// Revision of the last document read or written.
    pub last_revision: Option<Revision>,
    /// When local state last matched the remote document.
    pub last_synced_at: Option<SystemTime>,
    /// Whether the polling loop is running.
    pub polling: bool,
    /// Registered subscribers of either kind.
    pub subscribers: usize,
    /// Mutations currently in flight.
    pub in_flight: usize,
}

#[derive(Debug, Default)]
struct SyncRecord {
    last_revision: Option<Revision>,
    last_synced_at: Option<SystemTime>,
}

struct PollHandle {
    stop: watch::Sender<bool>,
    _task: JoinHandle<()>,
}

/// Shared-document sync engine.
///
/// Construct one per process and share it in an [`Arc`]; polling needs the
/// `Arc` to hand a weak reference to its background task.
pub struct SyncEngine<S: DocumentStore> {
    store: S,
    cache: RwLock<LocalStateCache>,
    gate: MutationGate,
    // Serializes read-modify-write sections within this process.
    write_lock: tokio::sync::Mutex<()>,
    record: Mutex<SyncRecord>,
    subscribers: Mutex<SubscriberRegistry<Callback>>,
    polling: Mutex<Option<PollHandle>>,
}

impl<S: DocumentStore> SyncEngine<S> {
    /// Create an engine with an empty cache.
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: RwLock::new(LocalStateCache::new()),
            gate: MutationGate::new(),
            write_lock: tokio::sync::Mutex::new(()),
            record: Mutex::new(SyncRecord::default()),
            subscribers: Mutex::new(SubscriberRegistry::new()),
            polling: Mutex::new(None),
        }
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Presentation interface
    // =========================================================================

    /// Current local state.
    pub fn snapshot(&self) -> Collection {
        self.read_cache().snapshot()
    }

    /// Read the remote document into local state.
    ///
    /// A failed read keeps the current state and reports why. A read that
    /// raced a local mutation is dropped the same way a poll would drop it.
    pub async fn load(&self) -> LoadReport {
        let epoch = self.gate.epoch();
        match self.store.fetch_document().await {
            Ok(remote) => {
                let loaded = {
                    let mut cache = self.write_cache();
                    self.gate.is_quiet_since(epoch).then(|| {
                        cache.replace(remote.collection);
                        cache.snapshot()
                    })
                };
                let Some(items) = loaded else {
                    tracing::debug!("Load raced a local mutation, keeping local state");
                    return LoadReport {
                        items: self.snapshot(),
                        warning: None,
                    };
                };

                tracing::info!("Loaded {} items at revision {}", items.len(), remote.revision);
                self.record_sync(Some(remote.revision));
                self.notify(&items);
                LoadReport {
                    items,
                    warning: None,
                }
            }
            Err(e) => {
                tracing::warn!("Initial load failed, starting from local state: {}", e);
                LoadReport {
                    items: self.snapshot(),
                    warning: Some(e),
                }
            }
        }
    }

    /// Register a change listener. It is called after every local state
    /// change with the new snapshot.
    pub fn subscribe<F>(&self, callback: F) -> SubscriberId
    where
        F: Fn(&Collection) + Send + Sync + 'static,
    {
        self.lock_subscribers()
            .register(SubscriberKind::Listener, Arc::new(callback))
            .id
    }

    /// Remove a subscriber of either kind. Removing the last polling
    /// subscriber stops the loop.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut polling = lock(&self.polling);
        let Some(removed) = self.lock_subscribers().unregister(id) else {
            return false;
        };
        if removed.kind == SubscriberKind::Poller && removed.last_of_kind {
            stop_loop(&mut polling);
        }
        true
    }

    /// Observable sync state.
    pub fn status(&self) -> SyncStatus {
        let record = lock(&self.record);
        SyncStatus {
            last_revision: record.last_revision.clone(),
            last_synced_at: record.last_synced_at,
            polling: lock(&self.polling).is_some(),
            subscribers: self.lock_subscribers().len(),
            in_flight: self.gate.in_flight(),
        }
    }

    // =========================================================================
    // Mutation API
    // =========================================================================

    /// Create an item at a position.
    pub async fn add(
        &self,
        x: f64,
        y: f64,
        name: impl Into<String>,
    ) -> Result<MutationOutcome, ClientError> {
        self.mutate(Mutation::Add {
            x,
            y,
            name: name.into(),
        })
        .await
    }

    /// Change an item's label.
    pub async fn rename(
        &self,
        id: ItemId,
        name: impl Into<String>,
    ) -> Result<MutationOutcome, ClientError> {
        self.mutate(Mutation::Rename {
            id,
            name: name.into(),
        })
        .await
    }

    /// Change an item's position.
    pub async fn move_item(&self, id: ItemId, x: f64, y: f64) -> Result<MutationOutcome, ClientError> {
        self.mutate(Mutation::Move { id, x, y }).await
    }

    /// Delete an item. Removing a missing id is a no-op.
    pub async fn remove(&self, id: ItemId) -> Result<MutationOutcome, ClientError> {
        self.mutate(Mutation::Remove { id }).await
    }

    /// Apply a mutation optimistically and persist it.
    ///
    /// Returns the outcome against the remote document; for `Add` its id
    /// may differ from the one shown optimistically when another client
    /// added items in the meantime.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidMutation`] / [`ClientError::Store`] before any
    ///   local change (bad coordinates, read-only store)
    /// - [`ClientError::RolledBack`] if persisting failed and local state was
    ///   reset to the remote document
    /// - [`ClientError::Diverged`] if persisting failed and the remote
    ///   document could not be re-read
    pub async fn mutate(&self, mutation: Mutation) -> Result<MutationOutcome, ClientError> {
        mutation.validate()?;
        if !self.store.is_writable() {
            return Err(ClientError::Store(StoreError::NotConfigured(
                "no credential configured; store is read-only".into(),
            )));
        }

        let _guard = self.gate.begin();

        let (pending, optimistic) = {
            let mut cache = self.write_cache();
            let (ticket, outcome) = cache.apply_optimistic(&mutation)?;
            let pending = PendingGuard {
                cache: &self.cache,
                ticket,
            };
            (pending, outcome.changed().then(|| cache.snapshot()))
        };
        if let Some(items) = optimistic {
            self.notify(&items);
        }

        let _write = self.write_lock.lock().await;
        match self.read_modify_write(&mutation).await {
            Ok((outcome, remote)) => {
                tracing::debug!("{:?} persisted at revision {}", outcome, remote.revision);
                self.replace_from_remote(remote, pending.ticket);
                Ok(outcome)
            }
            Err(source) => Err(self.roll_back(pending.ticket, source).await),
        }
    }

    async fn read_modify_write(
        &self,
        mutation: &Mutation,
    ) -> Result<(MutationOutcome, RemoteSnapshot), StoreError> {
        let latest = self.store.fetch_document().await?;
        let mut merged = latest.collection;
        let outcome = mutation.apply(&mut merged);

        if !outcome.changed() {
            // Nothing to write; adopt the remote state as is.
            return Ok((
                outcome,
                RemoteSnapshot {
                    collection: merged,
                    revision: latest.revision,
                },
            ));
        }

        let revision = self.store.write_document(&merged).await?;
        Ok((
            outcome,
            RemoteSnapshot {
                collection: merged,
                revision,
            },
        ))
    }

    async fn roll_back(&self, ticket: PendingTicket, source: StoreError) -> ClientError {
        tracing::warn!("Mutation failed, rolling back to remote state: {}", source);
        match self.store.fetch_document().await {
            Ok(remote) => {
                // Other pending edits survive the rollback.
                self.replace_from_remote(remote, ticket);
                ClientError::RolledBack { source }
            }
            Err(refetch) => {
                tracing::error!(
                    "Rollback fetch failed, local state may diverge from remote: {}",
                    refetch
                );
                // Local state matches no known revision; the next poll must apply.
                lock(&self.record).last_revision = None;
                ClientError::Diverged { source, refetch }
            }
        }
    }

    // =========================================================================
    // Polling
    // =========================================================================

    /// Run one polling cycle.
    ///
    /// Failures are logged and reported in the outcome, never raised.
    pub async fn poll_once(&self) -> PollOutcome {
        self.poll_cycle(None).await
    }

    async fn poll_cycle(&self, stop: Option<&watch::Receiver<bool>>) -> PollOutcome {
        let (state, actions) = PollState::new().on_event(PollEvent::TickElapsed);
        if !actions.contains(&PollAction::FetchDocument) {
            return PollOutcome::Unchanged;
        }

        let epoch = self.gate.epoch();
        let fetched = self.store.fetch_document().await;

        let mut outcome = PollOutcome::Unchanged;
        let mut applied = None;

        let (state, actions) = match fetched {
            Err(e) => {
                outcome = PollOutcome::Failed(e.clone());
                state.on_event(PollEvent::FetchFailed {
                    error: e.to_string(),
                })
            }
            Ok(remote) => {
                // A mutation's optimistic apply takes this lock, so the gate
                // check and the replace below cannot straddle one.
                let mut cache = self.write_cache();
                let event = PollEvent::FetchSucceeded {
                    changed: self.is_new_revision(&remote.revision),
                    gate_quiet: self.gate.is_quiet_since(epoch),
                    stopped: stop.is_some_and(|stop| *stop.borrow()),
                };
                let (state, actions) = state.on_event(event);

                for action in &actions {
                    match action {
                        PollAction::ApplySnapshot => {
                            cache.replace(remote.collection.clone());
                            applied = Some(cache.snapshot());
                        }
                        PollAction::Discard { reason } => {
                            outcome = match reason {
                                DiscardReason::Unchanged => {
                                    self.record_sync(None);
                                    PollOutcome::Unchanged
                                }
                                reason => PollOutcome::Discarded(*reason),
                            };
                            tracing::debug!("Poll result discarded: {:?}", reason);
                        }
                        _ => {}
                    }
                }
                if applied.is_some() {
                    tracing::info!("Applied remote change at revision {}", remote.revision);
                    self.record_sync(Some(remote.revision));
                }
                (state, actions)
            }
        };

        for action in actions {
            if let PollAction::LogFailure { error } = action {
                tracing::warn!("Poll failed: {}", error);
            }
        }

        if let Some(items) = applied {
            let (_, actions) = state.on_event(PollEvent::ApplyCompleted);
            if actions.contains(&PollAction::NotifySubscribers) {
                self.notify(&items);
            }
            outcome = PollOutcome::Applied;
        }

        outcome
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn replace_from_remote(&self, remote: RemoteSnapshot, settled: PendingTicket) {
        let items = {
            let mut cache = self.write_cache();
            cache.settle(settled, remote.collection);
            cache.snapshot()
        };
        self.record_sync(Some(remote.revision));
        self.notify(&items);
    }

    fn is_new_revision(&self, revision: &Revision) -> bool {
        lock(&self.record).last_revision.as_ref() != Some(revision)
    }

    fn record_sync(&self, revision: Option<Revision>) {
        let mut record = lock(&self.record);
        if let Some(revision) = revision {
            record.last_revision = Some(revision);
        }
        record.last_synced_at = Some(SystemTime::now());
    }

    /// Call every subscriber with `items`, outside all internal locks.
    fn notify(&self, items: &Collection) {
        let callbacks: Vec<Callback> = self.lock_subscribers().subscribers().cloned().collect();
        for callback in callbacks {
            callback(items);
        }
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, LocalStateCache> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, LocalStateCache> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, SubscriberRegistry<Callback>> {
        lock(&self.subscribers)
    }
}

impl<S: DocumentStore + 'static> SyncEngine<S> {
    /// Register a polling subscriber.
    ///
    /// The first polling subscriber starts the loop with `period` (first
    /// tick immediately); later ones share it and their period is ignored.
    /// Must be called inside a tokio runtime.
    pub fn start_polling<F>(self: &Arc<Self>, callback: F, period: Duration) -> SubscriberId
    where
        F: Fn(&Collection) + Send + Sync + 'static,
    {
        let mut polling = lock(&self.polling);
        let registration = self
            .lock_subscribers()
            .register(SubscriberKind::Poller, Arc::new(callback));

        if registration.first_of_kind {
            *polling = Some(self.spawn_poll_loop(period));
        }
        registration.id
    }

    /// Remove a polling subscriber. The loop stops with the last one.
    ///
    /// Returns false if `id` is not a registered polling subscriber.
    pub fn stop_polling(&self, id: SubscriberId) -> bool {
        if self.lock_subscribers().kind_of(id) != Some(SubscriberKind::Poller) {
            return false;
        }
        self.unsubscribe(id)
    }

    fn spawn_poll_loop(self: &Arc<Self>, period: Duration) -> PollHandle {
        let period = if period.is_zero() {
            tracing::warn!(
                "Zero poll interval, using {}s",
                DEFAULT_POLL_INTERVAL.as_secs()
            );
            DEFAULT_POLL_INTERVAL
        } else {
            period
        };

        let (stop, mut stop_rx) = watch::channel(false);
        let engine = Arc::downgrade(self);

        let task = tokio::spawn(async move {
            tracing::info!("Polling started (interval: {}ms)", period.as_millis());

            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = timer.tick() => {}
                    // Signalled, or the engine dropped its handle.
                    _ = stop_rx.changed() => break,
                }

                let Some(engine) = engine.upgrade() else {
                    break;
                };
                engine.poll_cycle(Some(&stop_rx)).await;
                drop(engine);

                if *stop_rx.borrow() {
                    break;
                }
            }

            tracing::info!("Polling stopped");
        });

        PollHandle { stop, _task: task }
    }
}

/// Drops a pending edit from the cache if its mutation future is cancelled
/// before the write settles.
struct PendingGuard<'a> {
    cache: &'a RwLock<LocalStateCache>,
    ticket: PendingTicket,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .forget(self.ticket);
    }
}

fn stop_loop(polling: &mut Option<PollHandle>) {
    if let Some(handle) = polling.take() {
        // The task may already have exited; nothing to signal then.
        let _ = handle.stop.send(true);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
