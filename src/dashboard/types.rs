//! Dashboard data model
//!
//! These types mirror the persisted JSON document exactly:
//!
//! ```json
//! [{"id": "…", "title": "Pairs", "widgets": [
//!     {"type": "erc20/token", "payload": {"address": "0xabc"},
//!      "layout": {"i": "…", "x": 0, "y": 0, "w": 3, "h": 3}}
//! ]}]
//! ```
//!
//! A widget has no id field of its own; its id is the layout key `i`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Type-specific widget configuration, opaque to the manager
pub type Payload = Map<String, Value>;

/// Layout key used by the grid for an item that is still being dragged in
pub const DROPPING_ITEM_KEY: &str = "__DROPPING_ITEM__";

/// Position and size of a widget on its dashboard's grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Widget id, duplicated here for correlation with the grid engine
    #[serde(default)]
    pub i: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// Grid-engine fields this crate does not interpret (`minW`, `static`, …)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Layout {
    /// Layout at `(x, y)` with size `w × h` and no key yet
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            i: String::new(),
            x,
            y,
            w,
            h,
            extra: Map::new(),
        }
    }

    /// Builder method: set the layout key
    pub fn key(mut self, i: impl Into<String>) -> Self {
        self.i = i.into();
        self
    }

    /// Builder method: set an extra grid-engine field
    pub fn extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// A configured data view placed on a dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    /// Registry tag selecting the renderer, e.g. `erc20/token`
    #[serde(rename = "type")]
    pub widget_type: String,
    #[serde(default)]
    pub payload: Payload,
    pub layout: Layout,
}

impl Widget {
    /// The widget id (its layout key)
    pub fn id(&self) -> &str {
        &self.layout.i
    }
}

/// Caller-supplied description of a widget to add
///
/// Any layout key in `layout.i` is ignored; the manager mints the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetDraft {
    #[serde(rename = "type")]
    pub widget_type: String,
    #[serde(default)]
    pub payload: Payload,
    pub layout: Layout,
}

impl WidgetDraft {
    pub fn new(widget_type: impl Into<String>, layout: Layout) -> Self {
        Self {
            widget_type: widget_type.into(),
            payload: Payload::new(),
            layout,
        }
    }

    /// Builder method: replace the payload
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Builder method: set one payload field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(name.into(), value.into());
        self
    }
}

/// A named collection of positioned widgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

impl Dashboard {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            widgets: Vec::new(),
        }
    }

    /// Summary view without widgets
    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary {
            id: self.id.clone(),
            title: self.title.clone(),
        }
    }

    pub fn widget(&self, widget_id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id() == widget_id)
    }

    pub fn widget_mut(&mut self, widget_id: &str) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| w.id() == widget_id)
    }

    /// Layouts of all widgets, in widget order
    pub fn layouts(&self) -> Vec<Layout> {
        self.widgets.iter().map(|w| w.layout.clone()).collect()
    }
}

/// `{id, title}` of a dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub id: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_widget_document_shape() {
        let widget = Widget {
            widget_type: "erc20/token".to_string(),
            payload: json!({"address": "0xabc"}).as_object().cloned().unwrap(),
            layout: Layout::new(0, 0, 3, 3).key("w1"),
        };

        let value = serde_json::to_value(&widget).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "erc20/token",
                "payload": {"address": "0xabc"},
                "layout": {"i": "w1", "x": 0, "y": 0, "w": 3, "h": 3}
            })
        );
        assert_eq!(widget.id(), "w1");
    }

    #[test]
    fn test_layout_keeps_grid_engine_fields() {
        let raw = json!({"i": "a", "x": 1, "y": 2, "w": 3, "h": 4, "minW": 2, "static": false, "moved": false});
        let layout: Layout = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(layout.extra.get("minW"), Some(&json!(2)));
        assert_eq!(serde_json::to_value(&layout).unwrap(), raw);
    }

    #[test]
    fn test_draft_layout_key_is_optional() {
        let draft: WidgetDraft = serde_json::from_value(json!({
            "type": "ethereum",
            "layout": {"x": 0, "y": 0, "w": 3, "h": 3}
        }))
        .unwrap();

        assert_eq!(draft.layout.i, "");
        assert!(draft.payload.is_empty());
    }

    #[test]
    fn test_dashboard_lookup_and_layouts() {
        let mut dashboard = Dashboard::new("d1", "Pairs");
        dashboard.widgets.push(Widget {
            widget_type: "ethereum".to_string(),
            payload: Payload::new(),
            layout: Layout::new(0, 0, 3, 3).key("a"),
        });

        assert!(dashboard.widget("a").is_some());
        assert!(dashboard.widget("b").is_none());
        assert_eq!(dashboard.layouts()[0].i, "a");
        assert_eq!(
            dashboard.summary(),
            DashboardSummary {
                id: "d1".to_string(),
                title: "Pairs".to_string()
            }
        );
    }
}
