//! Dashboard Manager
//!
//! In-memory authoritative model of every dashboard and its widgets.
//!
//! Every mutation follows the same path:
//!
//! ```text
//! clone working copy → apply change → save whole document → commit → notify listeners
//! ```
//!
//! If the save fails the working copy is dropped, so memory and storage
//! never disagree. Readers always receive owned copies; nothing returned
//! by a getter aliases manager state.
//!
//! Concurrent contexts follow last-write-wins: a context that writes from a
//! stale snapshot before reloading overwrites the other context's change.

use crate::dashboard::error::{DashboardError, DashboardResult};
use crate::dashboard::types::{Dashboard, DashboardSummary, Layout, Payload, Widget, WidgetDraft};
use crate::observer::{ListenerId, ListenerRegistry};
use crate::store::{StorageContext, StorageEvent, StorageSubscription, StoreResult};
use std::collections::HashMap;
use uuid::Uuid;

/// Storage key of the dashboards document
pub const DEFAULT_DASHBOARDS_KEY: &str = "dex-stats-api/ui/dashboards";

/// Owns all dashboards for one execution context
pub struct DashboardManager {
    context: StorageContext,
    key: String,
    dashboards: Vec<Dashboard>,
    listeners: ListenerRegistry,
}

impl DashboardManager {
    /// Load the dashboards document under the default key
    pub fn open(context: StorageContext) -> DashboardResult<Self> {
        Self::with_key(context, DEFAULT_DASHBOARDS_KEY)
    }

    /// Load the dashboards document under `key`
    ///
    /// A missing document is an empty collection; a malformed one is an
    /// error and is left untouched in storage.
    pub fn with_key(context: StorageContext, key: impl Into<String>) -> DashboardResult<Self> {
        let key = key.into();
        let dashboards = read_document(&context, &key)?;

        tracing::debug!(key = %key, dashboards = dashboards.len(), "Loaded dashboards");

        Ok(Self {
            context,
            key,
            dashboards,
            listeners: ListenerRegistry::new(),
        })
    }

    /// Storage key this manager persists under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Storage context this manager writes through
    pub fn context(&self) -> &StorageContext {
        &self.context
    }

    /// Re-read the document from storage and notify listeners
    ///
    /// On error the previous in-memory state is kept.
    pub fn reload(&mut self) -> DashboardResult<()> {
        self.dashboards = read_document(&self.context, &self.key)?;
        tracing::debug!(key = %self.key, dashboards = self.dashboards.len(), "Reloaded dashboards");
        self.listeners.notify();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// `{id, title}` of every dashboard, in order
    pub fn list_dashboards(&self) -> Vec<DashboardSummary> {
        self.dashboards.iter().map(Dashboard::summary).collect()
    }

    /// `{id, title}` of one dashboard
    pub fn get_dashboard(&self, id: &str) -> DashboardResult<DashboardSummary> {
        Ok(self.pick(id)?.summary())
    }

    pub fn has_dashboard(&self, id: &str) -> bool {
        self.dashboards.iter().any(|d| d.id == id)
    }

    /// Copies of a dashboard's widgets, in iteration order
    pub fn get_widgets(&self, id: &str) -> DashboardResult<Vec<Widget>> {
        Ok(self.pick(id)?.widgets.clone())
    }

    /// Copies of a dashboard's widget layouts, in widget order
    pub fn get_layouts(&self, id: &str) -> DashboardResult<Vec<Layout>> {
        Ok(self.pick(id)?.layouts())
    }

    /// Copy of the full collection, as persisted
    pub fn snapshot(&self) -> Vec<Dashboard> {
        self.dashboards.clone()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Append an empty dashboard and return its freshly minted id
    pub fn add_dashboard(&mut self, title: impl Into<String>) -> DashboardResult<String> {
        let title = title.into();
        self.edit(|dashboards| {
            let id = mint_id(|candidate| dashboards.iter().any(|d| d.id == candidate));
            dashboards.push(Dashboard::new(id.clone(), title));
            Ok(id)
        })
    }

    /// Remove a dashboard and its widgets
    ///
    /// Removing an unknown id is not an error; the (unchanged) document is
    /// still saved and listeners still notified.
    pub fn remove_dashboard(&mut self, id: &str) -> DashboardResult<()> {
        self.edit(|dashboards| {
            dashboards.retain(|d| d.id != id);
            Ok(())
        })
    }

    pub fn update_dashboard_title(
        &mut self,
        id: &str,
        title: impl Into<String>,
    ) -> DashboardResult<()> {
        let title = title.into();
        self.edit(|dashboards| {
            find_mut(dashboards, id)?.title = title;
            Ok(())
        })
    }

    /// Append a widget and return its freshly minted id
    ///
    /// Whatever key `draft.layout.i` carries is replaced by the new id.
    pub fn add_widget(&mut self, dashboard_id: &str, draft: WidgetDraft) -> DashboardResult<String> {
        self.edit(|dashboards| {
            let dashboard = find_mut(dashboards, dashboard_id)?;
            let id = mint_id(|candidate| dashboard.widget(candidate).is_some());

            let WidgetDraft {
                widget_type,
                payload,
                mut layout,
            } = draft;
            layout.i = id.clone();

            dashboard.widgets.push(Widget {
                widget_type,
                payload,
                layout,
            });
            Ok(id)
        })
    }

    /// Remove a widget; an unknown widget id is not an error
    pub fn remove_widget(&mut self, dashboard_id: &str, widget_id: &str) -> DashboardResult<()> {
        self.edit(|dashboards| {
            find_mut(dashboards, dashboard_id)?
                .widgets
                .retain(|w| w.id() != widget_id);
            Ok(())
        })
    }

    /// Replace a dashboard's arrangement with the grid's reported layouts
    ///
    /// The widget collection is rebuilt in the order of `layouts`. Layouts
    /// whose key matches no widget are dropped, widgets missing from
    /// `layouts` are removed, and a repeated key only counts once.
    pub fn update_dashboard_layouts(
        &mut self,
        dashboard_id: &str,
        layouts: &[Layout],
    ) -> DashboardResult<()> {
        self.edit(|dashboards| {
            let dashboard = find_mut(dashboards, dashboard_id)?;

            let mut by_id: HashMap<String, Widget> = dashboard
                .widgets
                .drain(..)
                .map(|w| (w.layout.i.clone(), w))
                .collect();

            dashboard.widgets = layouts
                .iter()
                .filter_map(|layout| {
                    by_id.remove(&layout.i).map(|mut widget| {
                        widget.layout = layout.clone();
                        widget
                    })
                })
                .collect();
            Ok(())
        })
    }

    /// Replace one widget's payload
    pub fn update_widget_payload(
        &mut self,
        dashboard_id: &str,
        widget_id: &str,
        payload: Payload,
    ) -> DashboardResult<()> {
        self.edit(|dashboards| {
            let dashboard = find_mut(dashboards, dashboard_id)?;
            let widget =
                dashboard
                    .widget_mut(widget_id)
                    .ok_or_else(|| DashboardError::WidgetNotFound {
                        dashboard_id: dashboard_id.to_string(),
                        widget_id: widget_id.to_string(),
                    })?;
            widget.payload = payload;
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Register a callback run after every committed change or reload
    pub fn add_event_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.add(listener)
    }

    /// Unregister a callback; unknown handles are ignored
    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Number of notifications sent so far
    pub fn revision(&self) -> u64 {
        self.listeners.revision()
    }

    // ------------------------------------------------------------------
    // Cross-context sync
    // ------------------------------------------------------------------

    /// Subscription to writes of this manager's key by other contexts
    pub fn subscribe_external(&self) -> StorageSubscription {
        self.context.subscribe(&self.key)
    }

    /// Reload if `event` concerns this manager's key
    ///
    /// Returns whether a reload happened.
    pub fn handle_storage_event(&mut self, event: &StorageEvent) -> DashboardResult<bool> {
        if !event.affects(&self.key) {
            return Ok(false);
        }
        self.reload()?;
        Ok(true)
    }

    /// Drain `subscription` and reload once if anything relevant arrived
    pub fn poll_external_changes(
        &mut self,
        subscription: &mut StorageSubscription,
    ) -> DashboardResult<bool> {
        let mut changed = false;
        while let Some(event) = subscription.try_next() {
            changed |= event.affects(&self.key);
        }
        if changed {
            self.reload()?;
        }
        Ok(changed)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn pick(&self, id: &str) -> DashboardResult<&Dashboard> {
        self.dashboards
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| DashboardError::DashboardNotFound(id.to_string()))
    }

    /// Apply `change` to a working copy, persist it, then commit and notify
    fn edit<R>(
        &mut self,
        change: impl FnOnce(&mut Vec<Dashboard>) -> DashboardResult<R>,
    ) -> DashboardResult<R> {
        let mut next = self.dashboards.clone();
        let output = change(&mut next)?;

        self.context.save(&self.key, &next)?;
        self.dashboards = next;

        tracing::debug!(
            key = %self.key,
            dashboards = self.dashboards.len(),
            revision = self.listeners.revision() + 1,
            "Committed dashboards"
        );

        self.listeners.notify();
        Ok(output)
    }
}

fn read_document(context: &StorageContext, key: &str) -> StoreResult<Vec<Dashboard>> {
    Ok(context.load(key)?.unwrap_or_default())
}

fn find_mut<'a>(dashboards: &'a mut [Dashboard], id: &str) -> DashboardResult<&'a mut Dashboard> {
    dashboards
        .iter_mut()
        .find(|d| d.id == id)
        .ok_or_else(|| DashboardError::DashboardNotFound(id.to_string()))
}

/// Fresh uuid v4 string not rejected by `taken`
fn mint_id(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if !taken(&id) {
            return id;
        }
    }
}
