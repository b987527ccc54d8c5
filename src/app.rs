//! Application root
//!
//! [`App`] is constructed once by the entry point and owns everything one
//! execution context needs: its storage context, the dashboard manager and
//! the API settings manager. It is handed down explicitly; there is no
//! global instance.

use crate::config::{Config, StorageBackend, StorageSettings};
use crate::dashboard::{DashboardError, DashboardManager};
use crate::settings::{ApiSettingsManager, SettingsError};
use crate::store::{
    FileArea, LocalStorage, MemoryArea, StorageContext, StorageEvent, StorageSubscription,
    StoreError, StoreResult,
};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while opening or syncing an [`App`]
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Dashboard error: {0}")]
    Dashboard(#[from] DashboardError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// Result type alias for app operations
pub type AppResult<T> = Result<T, AppError>;

/// One execution context's dashboard and settings state
pub struct App {
    config: Config,
    context: StorageContext,
    dashboards: DashboardManager,
    api_settings: ApiSettingsManager,
}

impl App {
    /// Open the configured storage origin and a first context on it
    pub fn open(config: Config) -> AppResult<Self> {
        let storage = open_storage(&config.storage)?;
        Self::attach(config, &storage)
    }

    /// Open another context on an existing origin (a second tab)
    pub fn attach(config: Config, storage: &LocalStorage) -> AppResult<Self> {
        let context = storage.context();
        let dashboards =
            DashboardManager::with_key(context.clone(), config.storage.dashboards_key.clone())?;
        let api_settings =
            ApiSettingsManager::with_key(context.clone(), config.storage.settings_key.clone())?;

        tracing::debug!(
            context_id = %context.id(),
            dashboards = dashboards.list_dashboards().len(),
            "Opened app context"
        );

        Ok(Self {
            config,
            context,
            dashboards,
            api_settings,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn context(&self) -> &StorageContext {
        &self.context
    }

    pub fn dashboards(&self) -> &DashboardManager {
        &self.dashboards
    }

    pub fn dashboards_mut(&mut self) -> &mut DashboardManager {
        &mut self.dashboards
    }

    pub fn api_settings(&self) -> &ApiSettingsManager {
        &self.api_settings
    }

    pub fn api_settings_mut(&mut self) -> &mut ApiSettingsManager {
        &mut self.api_settings
    }

    /// Credential headers for the GraphQL transport
    pub fn auth_headers(&self) -> Vec<(String, String)> {
        self.api_settings.get().auth_headers(&self.config.api)
    }

    /// Subscription to writes of any key by other contexts
    pub fn subscribe_external(&self) -> StorageSubscription {
        self.context.subscribe_all()
    }

    /// Route one storage event to whichever manager owns its key
    ///
    /// Both managers see every event; a failed reload in one does not keep
    /// the other from reloading. Returns whether any manager reloaded, or
    /// the first error.
    pub fn handle_storage_event(&mut self, event: &StorageEvent) -> AppResult<bool> {
        let dashboards = self.dashboards.handle_storage_event(event);
        let settings = self.api_settings.handle_storage_event(event);
        Ok(dashboards? | settings?)
    }

    /// Drain `subscription`, routing every pending event
    ///
    /// Keeps draining after a failed event and returns the first error.
    pub fn poll_external_changes(
        &mut self,
        subscription: &mut StorageSubscription,
    ) -> AppResult<bool> {
        let mut changed = false;
        let mut first_error = None;
        while let Some(event) = subscription.try_next() {
            match self.handle_storage_event(&event) {
                Ok(reloaded) => changed |= reloaded,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(changed),
        }
    }
}

/// Build the storage origin described by `settings`
pub fn open_storage(settings: &StorageSettings) -> StoreResult<LocalStorage> {
    let storage = match settings.backend {
        StorageBackend::File => {
            let area = FileArea::open(expand_home(&settings.data_dir))?;
            tracing::info!(data_dir = ?area.data_dir(), "Using file storage");
            LocalStorage::with_capacity(Arc::new(area), settings.event_capacity)
        }
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage");
            LocalStorage::with_capacity(Arc::new(MemoryArea::new()), settings.event_capacity)
        }
    };
    Ok(storage)
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{Layout, WidgetDraft, DEFAULT_DASHBOARDS_KEY};
    use crate::settings::ApiSettings;
    use tempfile::tempdir;

    fn memory_config() -> Config {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;
        config
    }

    #[test]
    fn test_open_file_backed_app() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = dir.path().to_string_lossy().to_string();

        {
            let mut app = App::open(config.clone()).unwrap();
            let id = app.dashboards_mut().add_dashboard("Pairs").unwrap();
            app.dashboards_mut()
                .add_widget(&id, WidgetDraft::new("ethereum", Layout::new(0, 0, 3, 3)))
                .unwrap();
            app.api_settings_mut().set_api_key("secret").unwrap();
        }

        let app = App::open(config).unwrap();
        let dashboards = app.dashboards().list_dashboards();
        assert_eq!(dashboards.len(), 1);
        assert_eq!(app.dashboards().get_widgets(&dashboards[0].id).unwrap().len(), 1);
        assert_eq!(app.api_settings().get(), ApiSettings::with_api_key("secret"));
    }

    #[test]
    fn test_custom_keys() {
        let mut config = memory_config();
        config.storage.dashboards_key = "custom/dashboards".to_string();
        config.storage.settings_key = "custom/settings".to_string();

        let storage = open_storage(&config.storage).unwrap();
        let mut app = App::attach(config, &storage).unwrap();
        app.dashboards_mut().add_dashboard("Pairs").unwrap();
        app.api_settings_mut().set_api_key("secret").unwrap();

        assert_eq!(
            storage.area().keys().unwrap(),
            vec!["custom/dashboards", "custom/settings"]
        );
    }

    #[test]
    fn test_poll_routes_events_to_both_managers() {
        let config = memory_config();
        let storage = open_storage(&config.storage).unwrap();
        let mut tab_a = App::attach(config.clone(), &storage).unwrap();
        let mut tab_b = App::attach(config, &storage).unwrap();
        let mut sub_b = tab_b.subscribe_external();

        tab_a.dashboards_mut().add_dashboard("Pairs").unwrap();
        tab_a.api_settings_mut().set_api_key("secret").unwrap();

        assert!(tab_b.poll_external_changes(&mut sub_b).unwrap());
        assert_eq!(tab_b.dashboards().list_dashboards().len(), 1);
        assert_eq!(tab_b.api_settings().get().api_key.as_deref(), Some("secret"));
        assert!(!tab_b.poll_external_changes(&mut sub_b).unwrap());
    }

    #[test]
    fn test_lagged_event_reaches_settings_despite_malformed_dashboards() {
        let mut config = memory_config();
        config.storage.event_capacity = 1;
        let storage = open_storage(&config.storage).unwrap();
        let writer = storage.context();
        let mut tab_a = App::attach(config.clone(), &storage).unwrap();
        let mut tab_b = App::attach(config.clone(), &storage).unwrap();
        let mut sub_b = tab_b.subscribe_external();

        tab_a.api_settings_mut().set_api_key("secret2").unwrap();
        writer
            .set_item(&config.storage.dashboards_key, "{broken")
            .unwrap();
        writer
            .set_item(&config.storage.dashboards_key, "{still broken")
            .unwrap();

        let err = tab_b.poll_external_changes(&mut sub_b).err().unwrap();
        assert!(matches!(err, AppError::Dashboard(DashboardError::Store(ref e)) if e.is_malformed()));
        assert_eq!(tab_b.api_settings().get().api_key.as_deref(), Some("secret2"));
        assert!(tab_b.dashboards().list_dashboards().is_empty());
    }

    #[test]
    fn test_event_for_every_key_reloads_both_managers() {
        let config = memory_config();
        let storage = open_storage(&config.storage).unwrap();
        let mut tab_a = App::attach(config.clone(), &storage).unwrap();
        let mut tab_b = App::attach(config, &storage).unwrap();

        tab_a.api_settings_mut().set_api_key("secret").unwrap();
        storage
            .context()
            .set_item(DEFAULT_DASHBOARDS_KEY, "[oops")
            .unwrap();

        let event = StorageEvent {
            key: None,
            origin: None,
            at: chrono::Utc::now(),
        };
        assert!(tab_b.handle_storage_event(&event).is_err());
        assert_eq!(tab_b.api_settings().get().api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_auth_headers_follow_settings() {
        let mut app = App::open(memory_config()).unwrap();
        assert!(app.auth_headers().is_empty());

        app.api_settings_mut().set_api_key("secret").unwrap();
        assert_eq!(
            app.auth_headers(),
            vec![("X-API-Key".to_string(), "secret".to_string())]
        );
    }

    #[test]
    fn test_malformed_store_aborts_open() {
        let config = memory_config();
        let storage = open_storage(&config.storage).unwrap();
        storage
            .context()
            .set_item(&config.storage.dashboards_key, "{oops")
            .unwrap();

        let err = App::attach(config, &storage).err().unwrap();
        assert!(matches!(err, AppError::Dashboard(DashboardError::Store(ref e)) if e.is_malformed()));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/var/lib/dex"), PathBuf::from("/var/lib/dex"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/dex"), home.join("dex"));
        }
    }
}
