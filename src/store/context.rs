//! Origins, execution contexts and cross-context change events
//!
//! A [`LocalStorage`] is one origin: a storage area plus a broadcast channel.
//! Every open view of the dashboard (a browser tab, a CLI invocation, a
//! test's simulated window) gets its own [`StorageContext`] on that origin.
//!
//! ```text
//!   context A ── save(key) ──► area.set_item ──► broadcast StorageEvent{key, origin: A}
//!                                                   │
//!   context B ◄── StorageSubscription (drops origin == B) ◄──┘
//! ```
//!
//! As with the browser `storage` event, a context never receives events for
//! its own writes: the writer already knows and notifies its observers
//! directly.

use crate::store::area::{FileArea, MemoryArea, StorageArea};
use crate::store::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use uuid::Uuid;

/// Unique identifier for an execution context
pub type ContextId = String;

/// Default capacity of the per-origin event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// A change made to the shared area by some context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageEvent {
    /// Key that changed; `None` means any key may have changed
    pub key: Option<String>,
    /// Writing context; `None` for events synthesized after lag
    pub origin: Option<ContextId>,
    /// When the write completed
    pub at: DateTime<Utc>,
}

impl StorageEvent {
    /// Whether this event may concern `key`
    pub fn affects(&self, key: &str) -> bool {
        self.key.as_deref().map_or(true, |k| k == key)
    }
}

/// Shared handle to one storage origin
///
/// The event channel lives in this process. Two `LocalStorage`s opened on
/// the same directory share data but not events, so a write made through
/// one is not announced to contexts of the other.
#[derive(Clone)]
pub struct LocalStorage {
    area: Arc<dyn StorageArea>,
    events: broadcast::Sender<StorageEvent>,
}

impl LocalStorage {
    /// Wrap an area with the default event capacity
    pub fn new(area: Arc<dyn StorageArea>) -> Self {
        Self::with_capacity(area, DEFAULT_EVENT_CAPACITY)
    }

    /// Wrap an area with a custom event channel capacity
    pub fn with_capacity(area: Arc<dyn StorageArea>, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self { area, events }
    }

    /// Ephemeral origin backed by a [`MemoryArea`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryArea::new()))
    }

    /// Durable origin backed by a [`FileArea`] rooted at `data_dir`
    pub fn open_dir(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(Arc::new(FileArea::open(data_dir)?)))
    }

    /// Open a new execution context on this origin
    pub fn context(&self) -> StorageContext {
        let id = Uuid::new_v4().to_string();
        tracing::debug!(context_id = %id, "Opened storage context");
        StorageContext {
            id,
            storage: self.clone(),
        }
    }

    /// The underlying area
    pub fn area(&self) -> &Arc<dyn StorageArea> {
        &self.area
    }
}

/// One execution context's view of a [`LocalStorage`]
#[derive(Clone)]
pub struct StorageContext {
    id: ContextId,
    storage: LocalStorage,
}

impl StorageContext {
    /// This context's identifier, stamped on every event it emits
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The origin this context belongs to
    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// Read a raw blob
    pub fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        self.storage.area.get_item(key)
    }

    /// Write a raw blob and announce it to the other contexts
    pub fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.storage.area.set_item(key, value)?;
        self.announce(Some(key));
        Ok(())
    }

    /// Delete a blob and announce it to the other contexts
    pub fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.storage.area.remove_item(key)?;
        self.announce(Some(key));
        Ok(())
    }

    /// Deserialize the JSON document stored under `key`
    ///
    /// An absent document is `Ok(None)`; the caller chooses the empty
    /// default. A document that does not parse is [`StoreError::Malformed`]
    /// and is never silently replaced.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let Some(json) = self.get_item(key)? else {
            return Ok(None);
        };

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StoreError::Malformed {
                key: key.to_string(),
                error: e.to_string(),
            })
    }

    /// Serialize `value` and overwrite the document under `key`
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let json = serde_json::to_string(value)?;
        self.set_item(key, &json)?;
        tracing::debug!(context_id = %self.id, key, bytes = json.len(), "Saved document");
        Ok(())
    }

    /// Events for `key` written by other contexts
    pub fn subscribe(&self, key: &str) -> StorageSubscription {
        StorageSubscription {
            rx: self.storage.events.subscribe(),
            origin: self.id.clone(),
            key: Some(key.to_string()),
        }
    }

    /// Events for every key written by other contexts
    pub fn subscribe_all(&self) -> StorageSubscription {
        StorageSubscription {
            rx: self.storage.events.subscribe(),
            origin: self.id.clone(),
            key: None,
        }
    }

    fn announce(&self, key: Option<&str>) {
        let event = StorageEvent {
            key: key.map(str::to_string),
            origin: Some(self.id.clone()),
            at: Utc::now(),
        };
        // No receivers just means no other context is listening
        let _ = self.storage.events.send(event);
    }
}

/// Receiving end of cross-context change events
///
/// Filters out events emitted by its own context and, when keyed, events
/// for other keys. If the receiver falls behind the channel capacity the
/// missed events collapse into one event with `key: None`.
pub struct StorageSubscription {
    rx: broadcast::Receiver<StorageEvent>,
    origin: ContextId,
    key: Option<String>,
}

impl StorageSubscription {
    /// Key this subscription is filtered to, if any
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Next pending event without waiting
    pub fn try_next(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(event);
                    }
                }
                Err(TryRecvError::Lagged(missed)) => return Some(self.lagged(missed)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next event; `None` once the origin is gone
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(event);
                    }
                }
                Err(RecvError::Lagged(missed)) => return Some(self.lagged(missed)),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn accepts(&self, event: &StorageEvent) -> bool {
        if event.origin.as_deref() == Some(self.origin.as_str()) {
            return false;
        }
        match &self.key {
            Some(key) => event.affects(key),
            None => true,
        }
    }

    fn lagged(&self, missed: u64) -> StorageEvent {
        tracing::debug!(context_id = %self.origin, missed, "Storage subscription lagged");
        StorageEvent {
            key: self.key.clone(),
            origin: None,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        count: u32,
    }

    #[test]
    fn test_load_absent_is_none() {
        let ctx = LocalStorage::in_memory().context();
        let doc: Option<Doc> = ctx.load("missing").unwrap();
        assert!(doc.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let ctx = LocalStorage::in_memory().context();
        let doc = Doc {
            name: "pairs".to_string(),
            count: 3,
        };
        ctx.save("doc", &doc).unwrap();

        let loaded: Doc = ctx.load("doc").unwrap().unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let ctx = LocalStorage::in_memory().context();
        ctx.set_item("doc", "{not json").unwrap();

        let err = ctx.load::<Doc>("doc").unwrap_err();
        assert!(err.is_malformed());
        // The bad blob is left in place
        assert_eq!(ctx.get_item("doc").unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn test_writes_do_not_notify_the_writer() {
        let storage = LocalStorage::in_memory();
        let tab_a = storage.context();
        let tab_b = storage.context();

        let mut sub_a = tab_a.subscribe("doc");
        let mut sub_b = tab_b.subscribe("doc");

        tab_a.set_item("doc", "1").unwrap();

        assert!(sub_a.try_next().is_none());
        let event = sub_b.try_next().unwrap();
        assert_eq!(event.key.as_deref(), Some("doc"));
        assert_eq!(event.origin.as_deref(), Some(tab_a.id()));
        assert!(sub_b.try_next().is_none());
    }

    #[test]
    fn test_keyed_subscription_ignores_other_keys() {
        let storage = LocalStorage::in_memory();
        let tab_a = storage.context();
        let tab_b = storage.context();

        let mut keyed = tab_b.subscribe("doc");
        let mut all = tab_b.subscribe_all();

        tab_a.set_item("other", "1").unwrap();
        tab_a.remove_item("doc").unwrap();

        let event = keyed.try_next().unwrap();
        assert_eq!(event.key.as_deref(), Some("doc"));
        assert!(keyed.try_next().is_none());

        assert_eq!(all.try_next().unwrap().key.as_deref(), Some("other"));
        assert_eq!(all.try_next().unwrap().key.as_deref(), Some("doc"));
        assert!(all.try_next().is_none());
    }

    #[test]
    fn test_lagged_subscription_collapses_to_one_event() {
        let storage = LocalStorage::with_capacity(Arc::new(MemoryArea::new()), 2);
        let writer = storage.context();
        let reader = storage.context();
        let mut sub = reader.subscribe("doc");

        for i in 0..10 {
            writer.set_item("doc", &i.to_string()).unwrap();
        }

        let first = sub.try_next().unwrap();
        assert_eq!(first.key.as_deref(), Some("doc"));
        assert!(first.origin.is_none());
    }

    #[test]
    fn test_contexts_share_a_file_origin() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::open_dir(dir.path()).unwrap();
        let tab_a = storage.context();
        let tab_b = storage.context();
        assert_ne!(tab_a.id(), tab_b.id());

        tab_a.save("doc", &vec![1, 2, 3]).unwrap();
        let loaded: Vec<u32> = tab_b.load("doc").unwrap().unwrap();
        assert_eq!(loaded, vec![1, 2, 3]);
    }

    #[test]
    fn test_origins_on_one_dir_share_data_not_events() {
        let dir = tempdir().unwrap();
        let cli = LocalStorage::open_dir(dir.path()).unwrap().context();
        let viewer = LocalStorage::open_dir(dir.path()).unwrap().context();
        let mut sub = viewer.subscribe_all();

        cli.save("doc", &vec![7]).unwrap();

        assert!(sub.try_next().is_none());
        let loaded: Vec<u32> = viewer.load("doc").unwrap().unwrap();
        assert_eq!(loaded, vec![7]);
    }

    #[tokio::test]
    async fn test_recv_waits_for_foreign_write() {
        let storage = LocalStorage::in_memory();
        let writer = storage.context();
        let reader = storage.context();
        let mut sub = reader.subscribe("doc");

        let handle = tokio::spawn(async move { sub.recv().await });
        writer.set_item("doc", "[]").unwrap();

        let event = handle.await.unwrap().unwrap();
        assert_eq!(event.origin.as_deref(), Some(writer.id()));
    }
}
