//! File-backed table catalog
//!
//! Stored at `<data_dir>/metadata/catalog.json`:
//!
//! ```json
//! {
//!   "tables": {
//!     "orders": { "columns": ["id", "status"], "primary_key": "id" }
//!   }
//! }
//! ```
//!
//! Record counts are not stored; they are read from the table file so they
//! can never drift from storage.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};
use super::provider::SchemaProvider;
use crate::observability::Logger;
use crate::storage::{write_bytes_atomic, StorageManager};

/// Definition of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    /// Column names in declaration order
    pub columns: Vec<String>,
    /// Primary key column, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tables: BTreeMap<String, TableDef>,
}

/// Table catalog persisted next to the data files
#[derive(Debug)]
pub struct Catalog {
    path: PathBuf,
    storage: StorageManager,
    tables: BTreeMap<String, TableDef>,
}

impl Catalog {
    /// Loads the catalog for `storage`, starting empty if none exists yet.
    pub fn open(storage: StorageManager) -> SchemaResult<Self> {
        let dir = storage.data_dir().join("metadata");
        fs::create_dir_all(&dir)
            .map_err(|e| SchemaError::io("Failed to create metadata directory", &dir, e))?;

        let path = dir.join("catalog.json");
        let tables = match fs::read_to_string(&path) {
            Ok(content) => {
                let file: CatalogFile = serde_json::from_str(&content)
                    .map_err(|e| SchemaError::malformed(&path, format!("Invalid JSON: {}", e)))?;
                file.tables
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(SchemaError::io("Failed to read catalog", &path, e)),
        };

        Ok(Self {
            path,
            storage,
            tables,
        })
    }

    /// Path of the catalog file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    /// Table names, sorted
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn table(&self, table: &str) -> Option<&TableDef> {
        self.tables.get(table)
    }

    pub fn table_exists(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Registers a table and creates its empty table file.
    ///
    /// The primary key, if given, must be one of `columns`. Indexing it is
    /// left to the caller.
    pub fn create_table(
        &mut self,
        table: &str,
        columns: Vec<String>,
        primary_key: Option<String>,
    ) -> SchemaResult<()> {
        if self.tables.contains_key(table) {
            return Err(SchemaError::TableExists {
                table: table.to_string(),
            });
        }
        if columns.is_empty() {
            return Err(SchemaError::invalid_definition(table, "at least one column is required"));
        }

        let mut seen = BTreeSet::new();
        for column in &columns {
            // Column names become index file names
            self.storage.index_path(table, column)?;
            if !seen.insert(column.as_str()) {
                return Err(SchemaError::invalid_definition(
                    table,
                    format!("duplicate column '{}'", column),
                ));
            }
        }

        if let Some(pk) = &primary_key {
            if !seen.contains(pk.as_str()) {
                return Err(SchemaError::invalid_definition(
                    table,
                    format!("primary key '{}' must be one of the columns", pk),
                ));
            }
        }

        self.storage.create_table_file(table)?;
        self.tables.insert(
            table.to_string(),
            TableDef {
                columns,
                primary_key,
            },
        );
        self.save()?;

        Logger::info("TABLE_CREATED", &[("table", table)]);
        Ok(())
    }

    /// Unregisters a table and deletes its table and index files.
    pub fn drop_table(&mut self, table: &str) -> SchemaResult<()> {
        if !self.tables.contains_key(table) {
            return Err(SchemaError::table_not_found(table));
        }

        for column in self.storage.list_indexes(table)? {
            self.storage.delete_index_file(table, &column)?;
        }
        self.storage.delete_table_file(table)?;

        self.tables.remove(table);
        self.save()?;

        Logger::info("TABLE_DROPPED", &[("table", table)]);
        Ok(())
    }

    /// Atomically rewrites the catalog file.
    pub fn save(&self) -> SchemaResult<()> {
        let file = CatalogFile {
            tables: self.tables.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| SchemaError::malformed(&self.path, format!("Failed to serialize: {}", e)))?;

        write_bytes_atomic(&self.path, json.as_bytes(), self.storage.sync_writes())?;
        Ok(())
    }

    fn def(&self, table: &str) -> SchemaResult<&TableDef> {
        self.tables
            .get(table)
            .ok_or_else(|| SchemaError::table_not_found(table))
    }
}

impl SchemaProvider for Catalog {
    fn get_primary_key(&self, table: &str) -> SchemaResult<Option<String>> {
        Ok(self.def(table)?.primary_key.clone())
    }

    fn get_record_count(&self, table: &str) -> SchemaResult<u64> {
        self.def(table)?;
        Ok(self.storage.live_record_count(table)? as u64)
    }
}
