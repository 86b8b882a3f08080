//! Storage error types
//!
//! Error codes:
//! - RDB_STORAGE_TABLE_NOT_FOUND
//! - RDB_STORAGE_INDEX_NOT_FOUND
//! - RDB_STORAGE_INVALID_RECORD_ID
//! - RDB_STORAGE_RECORD_DELETED
//! - RDB_STORAGE_INVALID_NAME
//! - RDB_STORAGE_IO_ERROR
//! - RDB_STORAGE_SERIALIZATION
//! - RDB_STORAGE_CORRUPTED

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Every failure the storage manager can report.
///
/// I/O and serialization failures are wrapped with a message naming the
/// operation and the file involved.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Table file for '{table}' does not exist")]
    TableNotFound { table: String },

    #[error("Index file for '{table}.{column}' does not exist")]
    IndexNotFound { table: String, column: String },

    #[error("Invalid record ID: {record_id} (table '{table}' has {len} records)")]
    InvalidRecordId {
        table: String,
        record_id: u64,
        len: usize,
    },

    #[error("Record {record_id} in table '{table}' is deleted")]
    RecordDeleted { table: String, record_id: u64 },

    #[error("Invalid {kind} name: '{name}'")]
    InvalidName { kind: &'static str, name: String },

    #[error("{message}: {path}")]
    Io {
        message: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{message}: {source}")]
    Serialization {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Corrupted file {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },
}

impl StorageError {
    /// Wraps an I/O failure on `path`.
    pub fn io(message: impl Into<String>, path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            message: message.into(),
            path: path.to_path_buf(),
            source,
        }
    }

    /// Wraps a serde_json failure.
    pub fn serialization(message: impl Into<String>, source: serde_json::Error) -> Self {
        StorageError::Serialization {
            message: message.into(),
            source,
        }
    }

    /// File contents failed framing or checksum validation.
    pub fn corrupted(path: &Path, reason: impl Into<String>) -> Self {
        StorageError::Corrupted {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::TableNotFound { .. } => "RDB_STORAGE_TABLE_NOT_FOUND",
            StorageError::IndexNotFound { .. } => "RDB_STORAGE_INDEX_NOT_FOUND",
            StorageError::InvalidRecordId { .. } => "RDB_STORAGE_INVALID_RECORD_ID",
            StorageError::RecordDeleted { .. } => "RDB_STORAGE_RECORD_DELETED",
            StorageError::InvalidName { .. } => "RDB_STORAGE_INVALID_NAME",
            StorageError::Io { .. } => "RDB_STORAGE_IO_ERROR",
            StorageError::Serialization { .. } => "RDB_STORAGE_SERIALIZATION",
            StorageError::Corrupted { .. } => "RDB_STORAGE_CORRUPTED",
        }
    }

    /// True when the target table or index file is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::TableNotFound { .. } | StorageError::IndexNotFound { .. }
        )
    }
}
