//! Drag items
//!
//! A tool hands the grid a small JSON document `{type, payload}` when one
//! of its entries is dragged; on drop the grid supplies the layout and the
//! pair becomes a [`WidgetDraft`] for the dashboard manager.

use crate::dashboard::{Layout, Payload, WidgetDraft, DROPPING_ITEM_KEY};
use crate::widgets::registry::{
    DROP_SIZE, ERC20_TOKEN, ETHEREUM, UNISWAP_V2_PAIR, UNISWAP_V2_PAIR_STATS,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MIME type the drag payload travels under
pub const DRAG_MIME_TYPE: &str = "text/json";

/// What a tool puts on the drag-and-drop transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragItem {
    #[serde(rename = "type")]
    pub widget_type: String,
    #[serde(default)]
    pub payload: Payload,
}

impl DragItem {
    pub fn new(widget_type: impl Into<String>) -> Self {
        Self {
            widget_type: widget_type.into(),
            payload: Payload::new(),
        }
    }

    fn with_address(widget_type: &str, address: impl Into<String>) -> Self {
        let mut item = Self::new(widget_type);
        item.payload
            .insert("address".to_string(), Value::String(address.into()));
        item
    }

    /// Network info widget
    pub fn ethereum() -> Self {
        Self::new(ETHEREUM)
    }

    /// Token metadata widget
    pub fn erc20_token(address: impl Into<String>) -> Self {
        Self::with_address(ERC20_TOKEN, address)
    }

    /// Trading-pair basic info widget
    pub fn uniswap_v2_pair(address: impl Into<String>) -> Self {
        Self::with_address(UNISWAP_V2_PAIR, address)
    }

    /// Trading-pair statistics widget
    pub fn uniswap_v2_pair_stats(address: impl Into<String>) -> Self {
        Self::with_address(UNISWAP_V2_PAIR_STATS, address)
    }

    /// Parse transfer data
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize as transfer data
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Combine with the layout the grid reported for the drop
    pub fn into_draft(self, layout: Layout) -> WidgetDraft {
        WidgetDraft {
            widget_type: self.widget_type,
            payload: self.payload,
            layout,
        }
    }
}

/// Placeholder layout the grid shows while an item is dragged over it
pub fn dropping_layout() -> Layout {
    Layout::new(0, 0, DROP_SIZE.0, DROP_SIZE.1).key(DROPPING_ITEM_KEY)
}
