//! CLI-specific error types
//!
//! Every CLI error carries a stable code; subsystem errors keep their own
//! code in the message.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::index::IndexError;
use crate::optimizer::OptimizerError;
use crate::schema::SchemaError;
use crate::storage::StorageError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Already initialized
    AlreadyInitialized,
    /// Not initialized
    NotInitialized,
    /// Argument refers to something that does not exist or is not allowed
    InvalidArgument,
    /// Storage, index, schema, or optimizer failure
    EngineError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "RDB_CLI_CONFIG_ERROR",
            Self::IoError => "RDB_CLI_IO_ERROR",
            Self::AlreadyInitialized => "RDB_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "RDB_CLI_NOT_INITIALIZED",
            Self::InvalidArgument => "RDB_CLI_INVALID_ARGUMENT",
            Self::EngineError => "RDB_CLI_ENGINE_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Already initialized
    pub fn already_initialized() -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            "Data directory already initialized",
        )
    }

    /// Not initialized
    pub fn not_initialized() -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            "Data directory not initialized. Run 'reldb init' first.",
        )
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidArgument, msg)
    }

    /// Wraps a subsystem error, keeping its code in the message
    fn engine(code: &str, err: impl fmt::Display) -> Self {
        Self::new(CliErrorCode::EngineError, format!("{}: {}", code, err))
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        Self::engine(e.code(), e)
    }
}

impl From<IndexError> for CliError {
    fn from(e: IndexError) -> Self {
        Self::engine(e.code(), e)
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::engine(e.code(), e)
    }
}

impl From<OptimizerError> for CliError {
    fn from(e: OptimizerError) -> Self {
        Self::engine(e.code(), e)
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_keep_subsystem_code() {
        let err: CliError = SchemaError::table_not_found("orders").into();
        assert_eq!(err.code(), &CliErrorCode::EngineError);
        assert_eq!(
            err.to_string(),
            "RDB_CLI_ENGINE_ERROR: RDB_SCHEMA_TABLE_NOT_FOUND: Table 'orders' does not exist"
        );
    }

    #[test]
    fn test_config_error_code() {
        let err: CliError = ConfigError::Invalid("bad".into()).into();
        assert_eq!(err.code_str(), "RDB_CLI_CONFIG_ERROR");
    }
}
