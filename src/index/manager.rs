//! Index Manager
//!
//! Keeps per-column index files consistent with their tables and answers
//! point and range lookups.
//!
//! # API
//!
//! - `create_index` / `drop_index` / `rebuild_index` / `rebuild_all`
//! - `update_index(key, id, old_key)` - incremental maintenance after a write
//! - `delete_from_index(key, id)` - incremental maintenance after a delete
//! - `lookup(key, op)` - comparison lookup
//! - `range_lookup(start, end, inclusive)` - bounded range lookup
//! - `get_all_keys` / `get_key_count` - statistics

use std::ops::Bound;

use super::errors::{IndexError, IndexResult};
use super::operator::ComparisonOp;
use crate::observability::ObservationScope;
use crate::storage::{IndexKey, IndexMap, RecordId, StorageManager};

/// Index Manager built on top of the storage manager
#[derive(Debug, Clone)]
pub struct IndexManager {
    storage: StorageManager,
}

impl IndexManager {
    /// Creates an index manager over `storage`
    pub fn new(storage: StorageManager) -> Self {
        Self { storage }
    }

    /// Returns the underlying storage manager
    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    /// Creates the index file and immediately populates it from the table.
    ///
    /// If populating fails the file is removed again, so a failed create
    /// never leaves an empty index behind.
    pub fn create_index(&self, table: &str, column: &str) -> IndexResult<()> {
        const OP: &str = "creating index";
        self.storage
            .create_index_file(table, column)
            .map_err(|e| IndexError::from_storage(OP, e))?;

        if let Err(e) = self.storage.rebuild_index(table, column) {
            let _ = self.storage.delete_index_file(table, column);
            return Err(IndexError::from_storage(OP, e));
        }
        Ok(())
    }

    /// Deletes the index file.
    pub fn drop_index(&self, table: &str, column: &str) -> IndexResult<()> {
        self.storage
            .delete_index_file(table, column)
            .map_err(|e| IndexError::from_storage("dropping index", e))
    }

    /// Recomputes an index from the table's live records.
    pub fn rebuild_index(&self, table: &str, column: &str) -> IndexResult<()> {
        self.storage
            .rebuild_index(table, column)
            .map(|_| ())
            .map_err(|e| IndexError::from_storage("rebuilding index", e))
    }

    /// Rebuilds every index of `table`. Returns the rebuilt column names.
    ///
    /// Required after `vacuum_table`, which renumbers record ids.
    pub fn rebuild_all(&self, table: &str) -> IndexResult<Vec<String>> {
        const OP: &str = "rebuilding indexes";
        let scope = ObservationScope::with_fields("INDEX_REBUILD_ALL", &[("table", table)]);

        let result = self
            .storage
            .list_indexes(table)
            .map_err(|e| IndexError::from_storage(OP, e))
            .and_then(|columns| {
                for column in &columns {
                    self.storage
                        .rebuild_index(table, column)
                        .map_err(|e| IndexError::from_storage(OP, e))?;
                }
                Ok(columns)
            });

        match &result {
            Ok(columns) => scope.complete_with_fields(&[("indexes", &columns.len().to_string())]),
            Err(e) => scope.fail(&e.to_string()),
        }
        result
    }

    /// Returns true if `(table, column)` has an index
    pub fn index_exists(&self, table: &str, column: &str) -> bool {
        self.storage.index_exists(table, column)
    }

    /// Indexed columns of `table`, sorted
    pub fn list_indexes(&self, table: &str) -> IndexResult<Vec<String>> {
        self.storage
            .list_indexes(table)
            .map_err(|e| IndexError::from_storage("listing indexes", e))
    }

    /// Records that `record_id` now has `key` in `column`.
    ///
    /// If `old_key` is given and present, the id is first removed from it.
    /// Correct when `old_key == key` and when `old_key` is not in the index.
    pub fn update_index(
        &self,
        table: &str,
        column: &str,
        key: &IndexKey,
        record_id: RecordId,
        old_key: Option<&IndexKey>,
    ) -> IndexResult<()> {
        const OP: &str = "updating index";
        let mut index = self.read(OP, table, column)?;

        if let Some(old) = old_key {
            index.remove(old, record_id);
        }
        index.insert(key.clone(), record_id);

        self.storage
            .write_index(table, column, &index)
            .map_err(|e| IndexError::from_storage(OP, e))
    }

    /// Removes `record_id` from `key`'s entry, dropping the key if emptied.
    pub fn delete_from_index(
        &self,
        table: &str,
        column: &str,
        key: &IndexKey,
        record_id: RecordId,
    ) -> IndexResult<()> {
        const OP: &str = "deleting from index";
        let mut index = self.read(OP, table, column)?;

        index.remove(key, record_id);

        self.storage
            .write_index(table, column, &index)
            .map_err(|e| IndexError::from_storage(OP, e))
    }

    /// Returns ids of records whose indexed value satisfies `value <op> key`.
    ///
    /// Empty when nothing matches.
    pub fn lookup(
        &self,
        table: &str,
        column: &str,
        key: &IndexKey,
        op: ComparisonOp,
    ) -> IndexResult<Vec<RecordId>> {
        let index = self.read("looking up in index", table, column)?;

        if op == ComparisonOp::Eq {
            return Ok(index.get(key).to_vec());
        }

        let mut result = Vec::new();
        for (k, ids) in index.iter() {
            if op.matches(k.cmp(key)) {
                result.extend_from_slice(ids);
            }
        }
        Ok(result)
    }

    /// Returns ids whose key lies between `start_key` and `end_key`.
    ///
    /// Bounds are both inclusive or both exclusive. An empty or inverted
    /// range yields no ids.
    pub fn range_lookup(
        &self,
        table: &str,
        column: &str,
        start_key: &IndexKey,
        end_key: &IndexKey,
        inclusive: bool,
    ) -> IndexResult<Vec<RecordId>> {
        let index = self.read("looking up range in index", table, column)?;

        let empty = if inclusive {
            start_key > end_key
        } else {
            start_key >= end_key
        };
        if empty {
            return Ok(Vec::new());
        }

        let bounds = if inclusive {
            (Bound::Included(start_key), Bound::Included(end_key))
        } else {
            (Bound::Excluded(start_key), Bound::Excluded(end_key))
        };

        let mut result = Vec::new();
        for (_, ids) in index.range(bounds) {
            result.extend_from_slice(ids);
        }
        Ok(result)
    }

    /// All distinct keys, in natural order
    pub fn get_all_keys(&self, table: &str, column: &str) -> IndexResult<Vec<IndexKey>> {
        let index = self.read("getting all keys", table, column)?;
        Ok(index.keys().cloned().collect())
    }

    /// Number of distinct keys (a cardinality proxy, not a row count)
    pub fn get_key_count(&self, table: &str, column: &str) -> IndexResult<usize> {
        let index = self.read("getting key count", table, column)?;
        Ok(index.key_count())
    }

    fn read(&self, operation: &'static str, table: &str, column: &str) -> IndexResult<IndexMap> {
        self.storage
            .read_index(table, column)
            .map_err(|e| IndexError::from_storage(operation, e))
    }
}
