//! Schema metadata subsystem
//!
//! Answers the two questions the optimizer asks about a table: its primary
//! key and its live record count.
//!
//! # Design Principles
//!
//! - Read-only boundary: planners depend on the `SchemaProvider` trait only
//! - Record counts come from storage, never from a cached counter

mod catalog;
mod errors;
mod provider;

pub use catalog::{Catalog, TableDef};
pub use errors::{SchemaError, SchemaResult};
pub use provider::{SchemaProvider, StaticSchema};
