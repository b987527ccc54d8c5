//! Dashboard manager error types

use crate::store::StoreError;
use thiserror::Error;

/// Errors raised by [`DashboardManager`](super::DashboardManager) operations
#[derive(Error, Debug)]
pub enum DashboardError {
    /// No dashboard has this id
    #[error("Dashboard not found: {0}")]
    DashboardNotFound(String),

    /// The dashboard exists but holds no widget with this id
    #[error("Widget not found: {widget_id} (dashboard {dashboard_id})")]
    WidgetNotFound {
        dashboard_id: String,
        widget_id: String,
    },

    /// Reading or writing the persisted document failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DashboardError {
    /// Whether the error is a stale reference to a dashboard or widget
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DashboardError::DashboardNotFound(_) | DashboardError::WidgetNotFound { .. }
        )
    }
}

/// Result type alias for dashboard operations
pub type DashboardResult<T> = Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DashboardError::DashboardNotFound("d1".to_string());
        assert_eq!(err.to_string(), "Dashboard not found: d1");
        assert!(err.is_not_found());

        let err = DashboardError::WidgetNotFound {
            dashboard_id: "d1".to_string(),
            widget_id: "w1".to_string(),
        };
        assert_eq!(err.to_string(), "Widget not found: w1 (dashboard d1)");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_store_error_conversion() {
        let err: DashboardError = StoreError::Lock("poisoned".to_string()).into();
        assert!(matches!(err, DashboardError::Store(_)));
        assert!(!err.is_not_found());
    }
}
