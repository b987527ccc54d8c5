//! Widget catalog
//!
//! - **registry**: Static widget and tool type tables
//! - **drag**: Tool-to-grid drag payloads

pub mod drag;
pub mod registry;

pub use drag::{dropping_layout, DragItem, DRAG_MIME_TYPE};
pub use registry::{
    require_widget_type, tool_type, widget_type, Logo, ToolType, UnknownWidgetType, WidgetType,
    DROP_SIZE, ERC20_TOKEN, ETHEREUM, TOOL_TYPES, UNISWAP_V2_PAIR, UNISWAP_V2_PAIR_STATS,
    WIDGET_TYPES,
};
