//! Cross-context sync task
//!
//! Storage events from other contexts arrive on a later turn of the event
//! loop than the write that caused them. This task waits for them and
//! routes each one to the shared [`App`], which reloads the affected
//! manager and notifies its listeners.
//!
//! Reload failures (for example another context writing a document this
//! build cannot parse) are logged and the last good state is kept.

use crate::app::App;
use crate::store::StorageEvent;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// An [`App`] shared between the view and the sync task
pub type SharedApp = Arc<Mutex<App>>;

/// Spawn the sync task for `app`
///
/// The subscription is taken before this returns, so no write made after
/// the call is missed. The task runs until aborted.
pub fn spawn_storage_sync(app: SharedApp) -> JoinHandle<()> {
    let subscription = match app.lock() {
        Ok(guard) => Some(guard.subscribe_external()),
        Err(e) => {
            tracing::warn!("App lock poisoned, storage sync not started: {}", e);
            None
        }
    };

    tokio::spawn(async move {
        let Some(mut subscription) = subscription else {
            return;
        };

        while let Some(event) = subscription.recv().await {
            if !apply_event(&app, &event) {
                break;
            }
        }

        tracing::debug!("Storage sync stopped");
    })
}

/// Route one event; returns `false` when the task should stop
fn apply_event(app: &Mutex<App>, event: &StorageEvent) -> bool {
    let mut guard = match app.lock() {
        Ok(guard) => guard,
        Err(e) => {
            tracing::warn!("App lock poisoned, stopping storage sync: {}", e);
            return false;
        }
    };

    match guard.handle_storage_event(event) {
        Ok(true) => {
            tracing::debug!(key = ?event.key, origin = ?event.origin, "Reloaded after external write");
        }
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(key = ?event.key, "Failed to reload after external write: {}", e);
        }
    }
    true
}
