//! reldb - file-backed relational storage with column indexes and a
//! cost-based query optimizer
//!
//! - `storage`: table and index files, tombstones, vacuum
//! - `index`: index maintenance and lookups
//! - `schema`: table catalog and the metadata the optimizer reads
//! - `optimizer`: selectivity, condition reordering, join methods, plans

pub mod cli;
pub mod config;
pub mod index;
pub mod observability;
pub mod optimizer;
pub mod schema;
pub mod storage;
