//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::dashboard::DEFAULT_DASHBOARDS_KEY;
use crate::settings::DEFAULT_SETTINGS_KEY;
use crate::store::DEFAULT_EVENT_CAPACITY;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which storage area backs the origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per key under `data_dir`
    File,
    /// Process memory; nothing survives exit
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

/// Persisted store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_dashboards_key")]
    pub dashboards_key: String,

    #[serde(default = "default_settings_key")]
    pub settings_key: String,

    /// Capacity of the cross-context event channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_backend() -> StorageBackend {
    StorageBackend::File
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("dex-dashboard").to_string_lossy().to_string())
        .unwrap_or_else(|| "./dex_dashboard_data".to_string())
}

fn default_dashboards_key() -> String {
    DEFAULT_DASHBOARDS_KEY.to_string()
}

fn default_settings_key() -> String {
    DEFAULT_SETTINGS_KEY.to_string()
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: default_data_dir(),
            dashboards_key: default_dashboards_key(),
            settings_key: default_settings_key(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// GraphQL endpoint configuration consumed by the transport
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_http_url")]
    pub http_url: String,

    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Header carrying the API key
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    /// Sent alongside the API key header
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
}

fn default_http_url() -> String {
    "http://localhost:8080/graphql".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:8080/graphql".to_string()
}

fn default_api_key_header() -> String {
    "X-API-Key".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            http_url: default_http_url(),
            ws_url: default_ws_url(),
            api_key_header: default_api_key_header(),
            extra_headers: BTreeMap::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("dex-dashboard").join("config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Storage overrides
        if let Some(data_dir) = var("DEX_DASHBOARD_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }
        if let Some(backend) = var("DEX_DASHBOARD_BACKEND") {
            match backend.parse::<StorageBackend>() {
                Ok(backend) => self.storage.backend = backend,
                Err(e) => tracing::warn!("Ignoring DEX_DASHBOARD_BACKEND: {}", e),
            }
        }

        // API overrides
        if let Some(url) = var("DEX_DASHBOARD_HTTP_URL") {
            self.api.http_url = url;
        }
        if let Some(url) = var("DEX_DASHBOARD_WS_URL") {
            self.api.ws_url = url;
        }

        // Logging overrides
        if let Some(level) = var("DEX_DASHBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("DEX_DASHBOARD_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    format!(
        r#"# DEX Dashboard Configuration
#
# Environment variables override these settings:
# - DEX_DASHBOARD_DATA_DIR
# - DEX_DASHBOARD_BACKEND
# - DEX_DASHBOARD_HTTP_URL
# - DEX_DASHBOARD_WS_URL
# - DEX_DASHBOARD_LOG_LEVEL
# - DEX_DASHBOARD_LOG_FORMAT

[storage]
# Storage area: file or memory
backend = "file"

# Directory holding one JSON document per key
data_dir = "~/.local/share/dex-dashboard"

# Document keys
dashboards_key = "{dashboards_key}"
settings_key = "{settings_key}"

# Pending cross-context events kept per subscriber
event_capacity = {event_capacity}

[api]
# GraphQL endpoints
http_url = "http://localhost:8080/graphql"
ws_url = "ws://localhost:8080/graphql"

# Header that carries the API key
api_key_header = "X-API-Key"

# Extra headers sent with the API key
# [api.extra_headers]
# X-Client = "dex-dashboard"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#,
        dashboards_key = DEFAULT_DASHBOARDS_KEY,
        settings_key = DEFAULT_SETTINGS_KEY,
        event_capacity = DEFAULT_EVENT_CAPACITY,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.dashboards_key, "dex-stats-api/ui/dashboards");
        assert_eq!(config.storage.settings_key, "dex-stats-api/ui/api/settings");
        assert_eq!(config.api.api_key_header, "X-API-Key");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.data_dir, "~/.local/share/dex-dashboard");
        assert_eq!(config.storage.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert!(config.api.extra_headers.is_empty());
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_config() {
        let config = Config::parse(
            r#"
            [storage]
            backend = "memory"

            [api.extra_headers]
            X-Client = "dex-dashboard"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.dashboards_key, DEFAULT_DASHBOARDS_KEY);
        assert_eq!(
            config.api.extra_headers.get("X-Client").map(String::as_str),
            Some("dex-dashboard")
        );
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DEX_DASHBOARD_DATA_DIR", "/tmp/dex"),
            ("DEX_DASHBOARD_BACKEND", "Memory"),
            ("DEX_DASHBOARD_HTTP_URL", "https://api.example/graphql"),
            ("DEX_DASHBOARD_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.storage.data_dir, "/tmp/dex");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.api.http_url, "https://api.example/graphql");
        assert_eq!(config.api.ws_url, "ws://localhost:8080/graphql");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_invalid_backend_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|name| {
            (name == "DEX_DASHBOARD_BACKEND").then(|| "sqlite".to_string())
        });
        assert_eq!(config.storage.backend, StorageBackend::File);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/dex-dashboard.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
