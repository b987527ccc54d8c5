//! # DEX Dashboard
//!
//! Client-side state for a personal grid of blockchain data widgets:
//! named dashboards of positioned widgets and the API credentials used to
//! fetch their data, persisted as JSON documents in a local key-value
//! store and kept in sync across open contexts.
//!
//! ## Features
//!
//! - **Whole-document persistence**: every change saves the full snapshot
//! - **Copy-on-read**: getters return owned copies, never views into state
//! - **Observers**: payload-free change notifications after every commit
//! - **Cross-context sync**: writes in one context reload the others
//!
//! ## Modules
//!
//! - [`store`]: Persisted store adapter and cross-context events
//! - [`dashboard`]: Dashboard data model and manager
//! - [`settings`]: API settings manager
//! - [`widgets`]: Widget type registry and drag payloads
//! - [`app`]: Explicit application root owning the managers
//! - [`sync`]: Async task applying other contexts' writes
//!
//! ## Quick Start
//!
//! ```rust
//! use dex_dashboard::dashboard::{DashboardManager, Layout, WidgetDraft};
//! use dex_dashboard::store::LocalStorage;
//!
//! let storage = LocalStorage::in_memory();
//! let mut manager = DashboardManager::open(storage.context()).unwrap();
//!
//! manager.add_event_listener(|| println!("dashboards changed"));
//!
//! let pairs = manager.add_dashboard("Pairs").unwrap();
//! let token = manager
//!     .add_widget(
//!         &pairs,
//!         WidgetDraft::new("erc20/token", Layout::new(0, 0, 3, 3)).field("address", "0xabc"),
//!     )
//!     .unwrap();
//!
//! // A second context on the same origin sees the saved document
//! let other = DashboardManager::open(storage.context()).unwrap();
//! assert_eq!(other.get_widgets(&pairs).unwrap()[0].id(), token);
//! ```

pub mod app;
pub mod config;
pub mod dashboard;
pub mod logging;
pub mod observer;
pub mod settings;
pub mod store;
pub mod sync;
pub mod widgets;

// Re-export top-level types for convenience
pub use store::{
    FileArea, LocalStorage, MemoryArea, StorageArea, StorageContext, StorageEvent,
    StorageSubscription, StoreError, StoreResult,
};

pub use dashboard::{
    Dashboard, DashboardError, DashboardManager, DashboardResult, DashboardSummary, Layout,
    Payload, Widget, WidgetDraft,
};

pub use observer::{ListenerId, ListenerRegistry};

pub use settings::{ApiSettings, ApiSettingsManager, SettingsError, SettingsResult};

pub use widgets::{DragItem, ToolType, UnknownWidgetType, WidgetType, TOOL_TYPES, WIDGET_TYPES};

pub use app::{open_storage, App, AppError, AppResult};

pub use sync::{spawn_storage_sync, SharedApp};

pub use config::{ApiConfig, Config, ConfigError, LoggingConfig, StorageBackend, StorageSettings};
