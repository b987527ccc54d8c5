//! Persisted store error types
//!
//! Defines all errors that can occur while reading or writing the
//! key-value storage area.

use thiserror::Error;

/// Errors that can occur in the persisted store
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document under `key` is not valid JSON for the expected shape
    #[error("Malformed store at {key:?}: {error}")]
    Malformed { key: String, error: String },

    /// Serialization of a value before writing failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl StoreError {
    /// Whether this error means the persisted document could not be parsed
    pub fn is_malformed(&self) -> bool {
        matches!(self, StoreError::Malformed { .. })
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::Malformed {
            key: "dex-stats-api/ui/dashboards".to_string(),
            error: "expected value at line 1 column 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed store at \"dex-stats-api/ui/dashboards\": expected value at line 1 column 1"
        );
        assert!(err.is_malformed());

        let err = StoreError::Lock("poisoned".to_string());
        assert_eq!(err.to_string(), "Lock error: poisoned");
        assert!(!err.is_malformed());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let store_err: StoreError = io_err.into();
        assert!(matches!(store_err, StoreError::Io(_)));
    }
}
