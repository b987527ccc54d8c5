//! Widget Type Registry
//!
//! Static, read-only catalog of the widget types the view layer can render
//! and of the tools that produce them. The dashboard manager never consults
//! this table: a stored widget whose tag is missing here is still stored,
//! and resolving it is the consumer's job.

use crate::dashboard::{Layout, Payload};
use serde::Serialize;
use thiserror::Error;

/// Icon shown next to a widget or tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Logo {
    Ethereum,
    Uniswap,
    Solidity,
}

/// A renderable widget type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WidgetType {
    /// Tag stored in `Widget::widget_type`
    #[serde(rename = "type")]
    pub tag: &'static str,
    /// Display name
    pub name: &'static str,
    pub logo: Logo,
    /// Grid size `(w, h)` of a freshly dropped widget
    pub default_size: (u32, u32),
    /// Payload fields the renderer reads
    pub payload_fields: &'static [&'static str],
}

impl WidgetType {
    /// Layout at `(x, y)` with this type's default size
    pub fn default_layout(&self, x: u32, y: u32) -> Layout {
        Layout::new(x, y, self.default_size.0, self.default_size.1)
    }

    /// Payload fields the renderer reads that `payload` does not set
    pub fn missing_fields(&self, payload: &Payload) -> Vec<&'static str> {
        self.payload_fields
            .iter()
            .copied()
            .filter(|field| !payload.contains_key(*field))
            .collect()
    }
}

/// A sidebar tool that produces draggable widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolType {
    #[serde(rename = "type")]
    pub tag: &'static str,
    pub name: &'static str,
    pub logo: Logo,
    /// Widget tags this tool can produce
    pub produces: &'static [&'static str],
}

pub const ETHEREUM: &str = "ethereum";
pub const UNISWAP_V2_PAIR: &str = "uniswap/v2/pair";
pub const UNISWAP_V2_PAIR_STATS: &str = "uniswap/v2/pair/stats";
pub const ERC20_TOKEN: &str = "erc20/token";

/// Grid size of the placeholder shown while a widget is dragged in
pub const DROP_SIZE: (u32, u32) = (3, 3);

/// Every renderable widget type
pub static WIDGET_TYPES: &[WidgetType] = &[
    WidgetType {
        tag: ETHEREUM,
        name: "Ethereum",
        logo: Logo::Ethereum,
        default_size: DROP_SIZE,
        payload_fields: &[],
    },
    WidgetType {
        tag: UNISWAP_V2_PAIR,
        name: "Uniswap V2 | Pair",
        logo: Logo::Uniswap,
        default_size: DROP_SIZE,
        payload_fields: &["address"],
    },
    WidgetType {
        tag: UNISWAP_V2_PAIR_STATS,
        name: "Uniswap V2 | Pair | Stats",
        logo: Logo::Uniswap,
        default_size: DROP_SIZE,
        payload_fields: &["address", "slices", "charts"],
    },
    WidgetType {
        tag: ERC20_TOKEN,
        name: "ERC-20 | Token",
        logo: Logo::Solidity,
        default_size: DROP_SIZE,
        payload_fields: &["address"],
    },
];

/// Every sidebar tool
pub static TOOL_TYPES: &[ToolType] = &[
    ToolType {
        tag: "ethereum",
        name: "Ethereum",
        logo: Logo::Ethereum,
        produces: &[ETHEREUM],
    },
    ToolType {
        tag: "uniswap/v2",
        name: "Uniswap V2",
        logo: Logo::Uniswap,
        produces: &[UNISWAP_V2_PAIR, UNISWAP_V2_PAIR_STATS],
    },
    ToolType {
        tag: "erc20",
        name: "ERC-20",
        logo: Logo::Solidity,
        produces: &[ERC20_TOKEN],
    },
];

/// A widget tag with no registered renderer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown widget type: {0}")]
pub struct UnknownWidgetType(pub String);

/// Look up a widget type by tag
pub fn widget_type(tag: &str) -> Option<&'static WidgetType> {
    WIDGET_TYPES.iter().find(|t| t.tag == tag)
}

/// Look up a widget type, failing for unregistered tags
pub fn require_widget_type(tag: &str) -> Result<&'static WidgetType, UnknownWidgetType> {
    widget_type(tag).ok_or_else(|| UnknownWidgetType(tag.to_string()))
}

/// Look up a tool by tag
pub fn tool_type(tag: &str) -> Option<&'static ToolType> {
    TOOL_TYPES.iter().find(|t| t.tag == tag)
}

impl ToolType {
    /// Registry entries for the widgets this tool produces
    pub fn widget_types(&self) -> impl Iterator<Item = &'static WidgetType> + '_ {
        self.produces.iter().filter_map(|tag| widget_type(tag))
    }
}
