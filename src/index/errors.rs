//! Index error types
//!
//! Error codes:
//! - RDB_INDEX_NOT_FOUND
//! - RDB_INDEX_STORAGE_FAILURE

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Index error wrapping the underlying storage failure
#[derive(Debug, Error)]
pub enum IndexError {
    /// The operation targeted an index that does not exist
    #[error("Error {operation}: no index on '{table}.{column}'")]
    NotFound {
        operation: &'static str,
        table: String,
        column: String,
    },

    /// Any other storage failure while manipulating an index
    #[error("Error {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: StorageError,
    },
}

impl IndexError {
    /// Wraps a storage error, promoting a missing index file to `NotFound`.
    pub fn from_storage(operation: &'static str, source: StorageError) -> Self {
        match source {
            StorageError::IndexNotFound { table, column } => IndexError::NotFound {
                operation,
                table,
                column,
            },
            source => IndexError::Storage { operation, source },
        }
    }

    /// Returns the stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::NotFound { .. } => "RDB_INDEX_NOT_FOUND",
            IndexError::Storage { .. } => "RDB_INDEX_STORAGE_FAILURE",
        }
    }

    /// Returns the underlying storage error, if any
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            IndexError::Storage { source, .. } => Some(source),
            IndexError::NotFound { .. } => None,
        }
    }
}
