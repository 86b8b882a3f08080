//! Optimizer error types
//!
//! The optimizer has no failure modes of its own; it surfaces metadata
//! failures unchanged.

use thiserror::Error;

use crate::index::IndexError;
use crate::schema::SchemaError;

/// Result type for optimizer operations
pub type OptimizerResult<T> = Result<T, OptimizerError>;

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl OptimizerError {
    /// Returns the code of the underlying error
    pub fn code(&self) -> &'static str {
        match self {
            OptimizerError::Schema(e) => e.code(),
            OptimizerError::Index(e) => e.code(),
        }
    }
}
