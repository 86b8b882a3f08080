//! Storage Manager subsystem
//!
//! Owns all file-level persistence: one table file per table (an ordered
//! record sequence) and one index file per (table, column) pair (a key →
//! record ids mapping).
//!
//! # Design Principles
//!
//! - Record id = position in the table file, assigned on insert
//! - Deletes tombstone in place; only vacuum compacts
//! - Every file is checksummed and replaced atomically (temp + rename)
//! - No dependency on the index or optimizer layers

mod codec;
mod errors;
mod index_map;
mod keys;
mod manager;
mod record;

pub use codec::{compute_checksum, write_bytes_atomic};
pub use errors::{StorageError, StorageResult};
pub use index_map::{IndexEntry, IndexMap};
pub use keys::IndexKey;
pub use manager::StorageManager;
pub use record::{Record, RecordId, DELETED_FIELD, ID_FIELD};
