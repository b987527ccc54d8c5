//! API Settings Manager
//!
//! One record per storage origin holding the API key the GraphQL transport
//! attaches to its requests. Same persist-then-notify contract as the
//! dashboard manager; there is no delete, saving an empty record clears it.

use crate::config::ApiConfig;
use crate::observer::{ListenerId, ListenerRegistry};
use crate::store::{StorageContext, StorageEvent, StorageSubscription, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage key of the API settings document
pub const DEFAULT_SETTINGS_KEY: &str = "dex-stats-api/ui/api/settings";

/// Connection credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ApiSettings {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
        }
    }

    /// Headers the transport must attach to every request
    ///
    /// Empty when no key is set; otherwise the configured API-key header
    /// followed by the configured extra headers.
    pub fn auth_headers(&self, api: &ApiConfig) -> Vec<(String, String)> {
        let Some(api_key) = &self.api_key else {
            return Vec::new();
        };

        let mut headers = vec![(api.api_key_header.clone(), api_key.clone())];
        headers.extend(
            api.extra_headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        headers
    }
}

/// Errors raised by [`ApiSettingsManager`]
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Reading or writing the persisted document failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for settings operations
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Owns the API settings record for one execution context
pub struct ApiSettingsManager {
    context: StorageContext,
    key: String,
    settings: ApiSettings,
    listeners: ListenerRegistry,
}

impl ApiSettingsManager {
    /// Load the settings record under the default key
    pub fn open(context: StorageContext) -> SettingsResult<Self> {
        Self::with_key(context, DEFAULT_SETTINGS_KEY)
    }

    /// Load the settings record under `key`; absent means empty settings
    pub fn with_key(context: StorageContext, key: impl Into<String>) -> SettingsResult<Self> {
        let key = key.into();
        let settings = context.load::<ApiSettings>(&key)?.unwrap_or_default();

        Ok(Self {
            context,
            key,
            settings,
            listeners: ListenerRegistry::new(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Copy of the current record
    pub fn get(&self) -> ApiSettings {
        self.settings.clone()
    }

    /// Replace the whole record
    pub fn set(&mut self, settings: ApiSettings) -> SettingsResult<()> {
        self.context.save(&self.key, &settings)?;
        self.settings = settings;

        tracing::debug!(key = %self.key, has_api_key = self.settings.api_key.is_some(), "Saved API settings");

        self.listeners.notify();
        Ok(())
    }

    /// Merge a new API key into the current record and save it
    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> SettingsResult<()> {
        let mut settings = self.settings.clone();
        settings.api_key = Some(api_key.into());
        self.set(settings)
    }

    /// Re-read the record from storage and notify listeners
    pub fn reload(&mut self) -> SettingsResult<()> {
        self.settings = self.context.load::<ApiSettings>(&self.key)?.unwrap_or_default();
        tracing::debug!(key = %self.key, "Reloaded API settings");
        self.listeners.notify();
        Ok(())
    }

    pub fn add_event_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.add(listener)
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn revision(&self) -> u64 {
        self.listeners.revision()
    }

    /// Subscription to writes of this record by other contexts
    pub fn subscribe_external(&self) -> StorageSubscription {
        self.context.subscribe(&self.key)
    }

    /// Reload if `event` concerns this record; returns whether it did
    pub fn handle_storage_event(&mut self, event: &StorageEvent) -> SettingsResult<bool> {
        if !event.affects(&self.key) {
            return Ok(false);
        }
        self.reload()?;
        Ok(true)
    }
}
