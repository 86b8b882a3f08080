//! Read-only schema metadata consumed by the optimizer

use std::collections::BTreeMap;

use super::errors::{SchemaError, SchemaResult};

/// Schema metadata the optimizer needs (read-only).
pub trait SchemaProvider {
    /// Primary key column of `table`, or `None` if it has none
    fn get_primary_key(&self, table: &str) -> SchemaResult<Option<String>>;

    /// Number of live records in `table`
    fn get_record_count(&self, table: &str) -> SchemaResult<u64>;
}

impl<T: SchemaProvider + ?Sized> SchemaProvider for &T {
    fn get_primary_key(&self, table: &str) -> SchemaResult<Option<String>> {
        (**self).get_primary_key(table)
    }

    fn get_record_count(&self, table: &str) -> SchemaResult<u64> {
        (**self).get_record_count(table)
    }
}

#[derive(Debug, Clone, Default)]
struct TableStats {
    primary_key: Option<String>,
    record_count: u64,
}

/// In-memory provider with fixed statistics.
///
/// Useful for planning against a known workload without touching disk.
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    tables: BTreeMap<String, TableStats>,
}

impl StaticSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `table`, replacing any earlier entry.
    pub fn with_table(
        mut self,
        table: impl Into<String>,
        primary_key: Option<&str>,
        record_count: u64,
    ) -> Self {
        self.tables.insert(
            table.into(),
            TableStats {
                primary_key: primary_key.map(str::to_string),
                record_count,
            },
        );
        self
    }

    fn stats(&self, table: &str) -> SchemaResult<&TableStats> {
        self.tables
            .get(table)
            .ok_or_else(|| SchemaError::table_not_found(table))
    }
}

impl SchemaProvider for StaticSchema {
    fn get_primary_key(&self, table: &str) -> SchemaResult<Option<String>> {
        Ok(self.stats(table)?.primary_key.clone())
    }

    fn get_record_count(&self, table: &str) -> SchemaResult<u64> {
        Ok(self.stats(table)?.record_count)
    }
}
