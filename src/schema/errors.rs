//! Schema error types
//!
//! Error codes:
//! - RDB_SCHEMA_TABLE_NOT_FOUND
//! - RDB_SCHEMA_TABLE_EXISTS
//! - RDB_SCHEMA_INVALID_DEFINITION
//! - RDB_SCHEMA_IO_ERROR
//! - RDB_SCHEMA_MALFORMED
//! - RDB_SCHEMA_STORAGE_FAILURE

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Failures reported by schema metadata providers
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Table '{table}' does not exist")]
    TableNotFound { table: String },

    #[error("Table '{table}' already exists")]
    TableExists { table: String },

    #[error("Invalid definition for table '{table}': {reason}")]
    InvalidDefinition { table: String, reason: String },

    #[error("{message}: {path}")]
    Io {
        message: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed catalog {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SchemaError {
    pub fn table_not_found(table: impl Into<String>) -> Self {
        SchemaError::TableNotFound {
            table: table.into(),
        }
    }

    pub fn invalid_definition(table: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::InvalidDefinition {
            table: table.into(),
            reason: reason.into(),
        }
    }

    pub fn io(message: impl Into<String>, path: &Path, source: io::Error) -> Self {
        SchemaError::Io {
            message: message.into(),
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        SchemaError::Malformed {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::TableNotFound { .. } => "RDB_SCHEMA_TABLE_NOT_FOUND",
            SchemaError::TableExists { .. } => "RDB_SCHEMA_TABLE_EXISTS",
            SchemaError::InvalidDefinition { .. } => "RDB_SCHEMA_INVALID_DEFINITION",
            SchemaError::Io { .. } => "RDB_SCHEMA_IO_ERROR",
            SchemaError::Malformed { .. } => "RDB_SCHEMA_MALFORMED",
            SchemaError::Storage(_) => "RDB_SCHEMA_STORAGE_FAILURE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            SchemaError::table_not_found("orders").code(),
            "RDB_SCHEMA_TABLE_NOT_FOUND"
        );
        assert_eq!(
            SchemaError::invalid_definition("orders", "no columns").code(),
            "RDB_SCHEMA_INVALID_DEFINITION"
        );
    }

    #[test]
    fn test_storage_error_is_transparent() {
        let inner = StorageError::TableNotFound {
            table: "orders".into(),
        };
        let expected = inner.to_string();
        let err: SchemaError = inner.into();
        assert_eq!(err.code(), "RDB_SCHEMA_STORAGE_FAILURE");
        assert_eq!(err.to_string(), expected);
    }
}
