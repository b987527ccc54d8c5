//! Persisted Store Adapter
//!
//! Durable key-value storage for whole JSON documents, plus the
//! cross-context change channel:
//!
//! - **area**: `StorageArea` trait with in-memory and directory-backed areas
//! - **context**: `LocalStorage` origins, per-context handles and events
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Write:  value → serde_json → area.set_item(key) → StorageEvent → other contexts
//! Read:   area.get_item(key) → serde_json → value | None | Malformed
//! ```
//!
//! # Example
//!
//! ```rust
//! use dex_dashboard::store::LocalStorage;
//!
//! let storage = LocalStorage::in_memory();
//! let tab_a = storage.context();
//! let tab_b = storage.context();
//!
//! let mut changes = tab_b.subscribe("greeting");
//! tab_a.save("greeting", &"hello").unwrap();
//!
//! assert!(changes.try_next().is_some());
//! let value: Option<String> = tab_b.load("greeting").unwrap();
//! assert_eq!(value.as_deref(), Some("hello"));
//! ```

pub mod area;
pub mod context;
pub mod error;

pub use area::{FileArea, MemoryArea, StorageArea};
pub use context::{
    ContextId, LocalStorage, StorageContext, StorageEvent, StorageSubscription,
    DEFAULT_EVENT_CAPACITY,
};
pub use error::{StoreError, StoreResult};
