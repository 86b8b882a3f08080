//! Observability subsystem
//!
//! Structured JSON logging shared by every other subsystem.
//!
//! # Usage
//!
//! ```ignore
//! use reldb::observability::{Logger, ObservationScope};
//!
//! Logger::info("TABLE_CREATED", &[("table", "users")]);
//!
//! let scope = ObservationScope::with_fields("VACUUM", &[("table", "users")]);
//! // ... do work ...
//! scope.complete();
//! ```

mod logger;
mod scope;

pub use logger::{Logger, Severity};
pub use scope::ObservationScope;
