//! Dashboards and their widgets
//!
//! - **types**: Persisted data model (`Dashboard`, `Widget`, `Layout`)
//! - **manager**: `DashboardManager`, the owner of all dashboard state
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust
//! use dex_dashboard::dashboard::{DashboardManager, Layout, WidgetDraft};
//! use dex_dashboard::store::LocalStorage;
//!
//! let mut manager = DashboardManager::open(LocalStorage::in_memory().context()).unwrap();
//!
//! let dashboard_id = manager.add_dashboard("Pairs").unwrap();
//! let widget_id = manager
//!     .add_widget(
//!         &dashboard_id,
//!         WidgetDraft::new("erc20/token", Layout::new(0, 0, 3, 3)).field("address", "0xabc"),
//!     )
//!     .unwrap();
//!
//! let widgets = manager.get_widgets(&dashboard_id).unwrap();
//! assert_eq!(widgets[0].id(), widget_id);
//! ```

pub mod error;
pub mod manager;
pub mod types;

pub use error::{DashboardError, DashboardResult};
pub use manager::{DashboardManager, DEFAULT_DASHBOARDS_KEY};
pub use types::{
    Dashboard, DashboardSummary, Layout, Payload, Widget, WidgetDraft, DROPPING_ITEM_KEY,
};
