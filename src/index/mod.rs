//! Index Manager subsystem
//!
//! Secondary indexes over single columns, persisted by the storage layer as
//! one file per (table, column).
//!
//! # Design Principles
//!
//! - Derived state: an index can always be rebuilt from its table
//! - Deterministic: keys iterate in natural order, ids ascending per key
//! - Incremental maintenance is the caller's job after each record write
//!
//! # Invariants
//!
//! - A key is present iff at least one id is stored under it
//! - After `vacuum_table`, indexes are stale until `rebuild_all`

mod errors;
mod manager;
mod operator;

pub use crate::storage::{IndexKey, IndexMap};
pub use errors::{IndexError, IndexResult};
pub use manager::IndexManager;
pub use operator::ComparisonOp;
