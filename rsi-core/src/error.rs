//! Error types for catalog operations

use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Backing store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Operation '{operation}' timed out after {timeout_secs}s")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },

    #[error("Insert into {collection} failed: {reason}")]
    InsertFailed { collection: String, reason: String },

    #[error("Query on {collection} failed: {reason}")]
    QueryFailed { collection: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors for submitted data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },
}

/// Master error type for catalog operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CatalogError {
    /// Convenience constructor for an unreachable or failing store.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        CatalogError::Storage(StorageError::Unavailable {
            reason: reason.into(),
        })
    }

    /// Whether this error means the backing store could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            CatalogError::Storage(StorageError::Unavailable { .. } | StorageError::Timeout { .. })
        )
    }
}

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
