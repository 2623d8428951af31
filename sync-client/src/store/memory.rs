//! In-memory document store for testing.
//!
//! Clones share one document, so several engines built on clones of the
//! same store behave like independent clients of one hosted document.
//! Failures can be queued and fetches or writes can be parked mid-flight.

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use sync_types::{Collection, DocumentFile, RemoteDocument, Revision};
use tokio::sync::oneshot;

use super::{decode_snapshot, DocumentStore, RemoteSnapshot, StoreError};
use crate::config::DEFAULT_FILE_NAME;

/// In-memory [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
    writable: bool,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    content: Option<String>,
    revision: u64,
    fetch_count: usize,
    write_count: usize,
    fail_fetches: VecDeque<StoreError>,
    fail_writes: VecDeque<StoreError>,
    blocked_fetch: Option<Parked>,
    blocked_write: Option<Parked>,
}

type Parked = (oneshot::Sender<()>, oneshot::Receiver<()>);

/// Handle for a call parked by [`MemoryStore::block_next_fetch`] or
/// [`MemoryStore::block_next_write`].
#[derive(Debug)]
pub struct StoreBlock {
    /// Resolves once the call has reached the store.
    pub started: oneshot::Receiver<()>,
    /// Send (or drop) to let the call continue.
    pub release: oneshot::Sender<()>,
}

impl MemoryStore {
    /// Create a writable store holding an empty document.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryStoreInner::default())),
            writable: true,
        }
    }

    /// Create a writable store holding `items`.
    pub fn with_items(items: &Collection) -> Self {
        let store = Self::new();
        store.set_items(items);
        store
    }

    /// A handle on the same document without write access.
    pub fn read_only(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            writable: false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overwrite the document as another client would.
    pub fn set_items(&self, items: &Collection) {
        // Finite coordinates always encode; an empty file stands in otherwise.
        let content = items.to_content().unwrap_or_default();
        self.set_raw_content(&content);
    }

    /// Overwrite the tracked file with arbitrary text.
    pub fn set_raw_content(&self, content: &str) {
        let mut inner = self.lock();
        inner.content = Some(content.to_string());
        inner.revision += 1;
    }

    /// Delete the tracked file from the document.
    pub fn clear_file(&self) {
        let mut inner = self.lock();
        inner.content = None;
        inner.revision += 1;
    }

    /// Decoded current content (malformed content decodes as empty).
    pub fn items(&self) -> Collection {
        let inner = self.lock();
        inner
            .content
            .as_deref()
            .and_then(|content| Collection::from_content(content).ok())
            .unwrap_or_default()
    }

    /// Raw current file text.
    pub fn raw_content(&self) -> Option<String> {
        self.lock().content.clone()
    }

    /// Current revision marker.
    pub fn revision(&self) -> Revision {
        revision_marker(self.lock().revision)
    }

    /// Number of completed fetch attempts (including injected failures).
    pub fn fetch_count(&self) -> usize {
        self.lock().fetch_count
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.lock().write_count
    }

    /// Queue a failure for an upcoming fetch. Queued failures apply in order.
    pub fn fail_next_fetch(&self, error: StoreError) {
        self.lock().fail_fetches.push_back(error);
    }

    /// Queue a failure for an upcoming write.
    pub fn fail_next_write(&self, error: StoreError) {
        self.lock().fail_writes.push_back(error);
    }

    /// Queue a non-success status for an upcoming write.
    pub fn reject_next_write(&self, status: u16, message: &str) {
        self.fail_next_write(StoreError::Rejected {
            status,
            message: message.to_string(),
        });
    }

    /// Park the next fetch until the returned block is released. The
    /// document is read after the release.
    pub fn block_next_fetch(&self) -> StoreBlock {
        let (parked, block) = park();
        self.lock().blocked_fetch = Some(parked);
        block
    }

    /// Park the next write until the returned block is released.
    pub fn block_next_write(&self) -> StoreBlock {
        let (parked, block) = park();
        self.lock().blocked_write = Some(parked);
        block
    }
}

fn park() -> (Parked, StoreBlock) {
    let (started_tx, started) = oneshot::channel();
    let (release, release_rx) = oneshot::channel();
    ((started_tx, release_rx), StoreBlock { started, release })
}

async fn wait_if_parked(parked: Option<Parked>) {
    if let Some((started, release)) = parked {
        let _ = started.send(());
        // A dropped sender releases as well.
        let _ = release.await;
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn revision_marker(revision: u64) -> Revision {
    Revision::new(format!("rev-{}", revision))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch_document(&self) -> Result<RemoteSnapshot, StoreError> {
        let blocked = self.lock().blocked_fetch.take();
        wait_if_parked(blocked).await;

        let mut inner = self.lock();
        inner.fetch_count += 1;

        if let Some(error) = inner.fail_fetches.pop_front() {
            return Err(error);
        }

        let mut files = BTreeMap::new();
        if let Some(content) = &inner.content {
            files.insert(
                DEFAULT_FILE_NAME.to_string(),
                DocumentFile {
                    content: Some(content.clone()),
                },
            );
        }
        let document = RemoteDocument {
            updated_at: revision_marker(inner.revision),
            files,
        };
        drop(inner);

        Ok(decode_snapshot(document, DEFAULT_FILE_NAME))
    }

    async fn write_document(&self, items: &Collection) -> Result<Revision, StoreError> {
        if !self.writable {
            return Err(StoreError::NotConfigured("read-only store".into()));
        }

        let blocked = self.lock().blocked_write.take();
        wait_if_parked(blocked).await;

        let content = items
            .to_content()
            .map_err(|e| StoreError::Encoding(e.to_string()))?;

        let mut inner = self.lock();
        if let Some(error) = inner.fail_writes.pop_front() {
            return Err(error);
        }
        inner.content = Some(content);
        inner.revision += 1;
        inner.write_count += 1;
        Ok(revision_marker(inner.revision))
    }

    fn is_writable(&self) -> bool {
        self.writable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_types::{Item, ItemId};

    fn items(ids: &[u64]) -> Collection {
        Collection::from_items(
            ids.iter()
                .map(|&id| Item::new(ItemId::new(id), id as f64, 0.0, ""))
                .collect(),
        )
    }

    #[tokio::test]
    async fn empty_store_fetches_empty() {
        let store = MemoryStore::new();
        let snapshot = store.fetch_document().await.unwrap();
        assert!(snapshot.collection.is_empty());
        assert_eq!(snapshot.revision, Revision::new("rev-0"));
    }

    #[tokio::test]
    async fn clones_share_document() {
        let a = MemoryStore::new();
        let b = a.clone();

        let revision = a.write_document(&items(&[1, 2])).await.unwrap();
        let snapshot = b.fetch_document().await.unwrap();

        assert_eq!(snapshot.collection, items(&[1, 2]));
        assert_eq!(snapshot.revision, revision);
    }

    #[tokio::test]
    async fn revisions_increase_on_every_write() {
        let store = MemoryStore::new();
        let r1 = store.write_document(&items(&[1])).await.unwrap();
        let r2 = store.write_document(&items(&[1])).await.unwrap();
        assert_ne!(r1, r2);
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn read_only_handle_cannot_write() {
        let store = MemoryStore::with_items(&items(&[1]));
        let reader = store.read_only();

        assert!(!reader.is_writable());
        assert!(matches!(
            reader.write_document(&Collection::new()).await,
            Err(StoreError::NotConfigured(_))
        ));
        assert_eq!(reader.fetch_document().await.unwrap().collection, items(&[1]));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn queued_failures_apply_in_order() {
        let store = MemoryStore::new();
        store.fail_next_fetch(StoreError::Unavailable("first".into()));
        store.fail_next_fetch(StoreError::Unavailable("second".into()));

        assert_eq!(
            store.fetch_document().await,
            Err(StoreError::Unavailable("first".into()))
        );
        assert_eq!(
            store.fetch_document().await,
            Err(StoreError::Unavailable("second".into()))
        );
        assert!(store.fetch_document().await.is_ok());
        assert_eq!(store.fetch_count(), 3);
    }

    #[tokio::test]
    async fn rejected_write_leaves_content() {
        let store = MemoryStore::with_items(&items(&[1]));
        store.reject_next_write(409, "conflict");

        let result = store.write_document(&items(&[1, 2])).await;
        assert!(matches!(result, Err(StoreError::Rejected { status: 409, .. })));
        assert_eq!(store.items(), items(&[1]));
    }

    #[tokio::test]
    async fn malformed_content_fetches_empty() {
        let store = MemoryStore::new();
        store.set_raw_content("not json at all");
        assert!(store.fetch_document().await.unwrap().collection.is_empty());

        store.clear_file();
        assert!(store.fetch_document().await.unwrap().collection.is_empty());
    }

    #[tokio::test]
    async fn blocked_write_waits_for_release() {
        let store = MemoryStore::new();
        let block = store.block_next_write();

        let writer = store.clone();
        let task = tokio::spawn(async move { writer.write_document(&items(&[7])).await });

        block.started.await.unwrap();
        assert_eq!(store.write_count(), 0);

        block.release.send(()).unwrap();
        task.await.unwrap().unwrap();
        assert_eq!(store.items(), items(&[7]));
    }

    #[tokio::test]
    async fn blocked_fetch_reads_document_after_release() {
        let store = MemoryStore::with_items(&items(&[1]));
        let block = store.block_next_fetch();

        let reader = store.clone();
        let task = tokio::spawn(async move { reader.fetch_document().await });

        block.started.await.unwrap();
        store.set_items(&items(&[1, 2]));

        block.release.send(()).unwrap();
        let snapshot = task.await.unwrap().unwrap();
        assert_eq!(snapshot.collection, items(&[1, 2]));
        assert_eq!(store.fetch_count(), 1);
    }
}
