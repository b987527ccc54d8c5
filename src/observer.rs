//! Change listeners
//!
//! Observers are payload-free: a notification only says "something changed,
//! re-read". Registration returns a [`ListenerId`] which is the only way to
//! unregister, so removal never depends on comparing closures.

use std::sync::Arc;

/// Callback invoked after every committed change
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`ListenerRegistry::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Ordered set of listeners
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
    revision: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it is called after every later notification
    pub fn add<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Arc::new(listener)));
        tracing::debug!(listener = id.0, count = self.listeners.len(), "Listener added");
        id
    }

    /// Unregister a listener; unknown ids are ignored
    ///
    /// Returns whether a listener was removed.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        let removed = self.listeners.len() != before;
        if removed {
            tracing::debug!(listener = id.0, count = self.listeners.len(), "Listener removed");
        }
        removed
    }

    /// Bump the revision and call every listener in registration order
    pub fn notify(&mut self) {
        self.revision += 1;
        // Snapshot so the set being notified is fixed for this round
        let snapshot: Vec<Listener> = self
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener();
        }
    }

    /// Number of notifications sent so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
