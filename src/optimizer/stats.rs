//! Index statistics seen by the optimizer

use crate::index::{IndexManager, IndexResult};

/// Read-only view of index metadata.
pub trait IndexStatistics {
    /// Returns true if `(table, column)` is indexed
    fn index_exists(&self, table: &str, column: &str) -> bool;

    /// Number of distinct keys in the index
    fn key_count(&self, table: &str, column: &str) -> IndexResult<usize>;
}

impl IndexStatistics for IndexManager {
    fn index_exists(&self, table: &str, column: &str) -> bool {
        IndexManager::index_exists(self, table, column)
    }

    fn key_count(&self, table: &str, column: &str) -> IndexResult<usize> {
        self.get_key_count(table, column)
    }
}

impl<T: IndexStatistics + ?Sized> IndexStatistics for &T {
    fn index_exists(&self, table: &str, column: &str) -> bool {
        (**self).index_exists(table, column)
    }

    fn key_count(&self, table: &str, column: &str) -> IndexResult<usize> {
        (**self).key_count(table, column)
    }
}
