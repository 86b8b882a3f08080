//! Storage manager: table and index file persistence
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/data/<table>.tbl
//! <data_dir>/indexes/<table>/<column>.idx
//! ```
//!
//! Every mutating operation follows read → validate → write, and writes go
//! through an atomic replace, so a failure never leaves a partially updated
//! file behind.

use std::fs;
use std::path::{Path, PathBuf};

use super::codec::{self, FileKind};
use super::errors::{StorageError, StorageResult};
use super::index_map::IndexMap;
use super::keys::IndexKey;
use super::record::{Record, RecordId};
use crate::observability::{Logger, ObservationScope};

const TABLE_EXT: &str = "tbl";
const INDEX_EXT: &str = "idx";

/// Owns all file-level persistence for tables and indexes.
///
/// The base directory is fixed at construction; every path is a pure
/// function of it and the table/column names.
#[derive(Debug, Clone)]
pub struct StorageManager {
    data_dir: PathBuf,
    table_dir: PathBuf,
    index_dir: PathBuf,
    sync_writes: bool,
}

impl StorageManager {
    /// Opens the storage rooted at `data_dir`, creating `data/` and
    /// `indexes/` if missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directories cannot be created.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        let table_dir = data_dir.join("data");
        let index_dir = data_dir.join("indexes");

        for dir in [&table_dir, &index_dir] {
            fs::create_dir_all(dir)
                .map_err(|e| StorageError::io("Failed to create storage directory", dir, e))?;
        }

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            table_dir,
            index_dir,
            sync_writes: true,
        })
    }

    /// Enables or disables fsync during atomic file replacement.
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Whether writes are fsynced before and after the rename.
    pub fn sync_writes(&self) -> bool {
        self.sync_writes
    }

    /// Returns the base data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the table file for `table`.
    pub fn table_path(&self, table: &str) -> StorageResult<PathBuf> {
        validate_name("table", table)?;
        Ok(self.table_dir.join(format!("{}.{}", table, TABLE_EXT)))
    }

    /// Path of the index file for `(table, column)`.
    pub fn index_path(&self, table: &str, column: &str) -> StorageResult<PathBuf> {
        validate_name("table", table)?;
        validate_name("column", column)?;
        Ok(self
            .index_dir
            .join(table)
            .join(format!("{}.{}", column, INDEX_EXT)))
    }

    // ---------------------------------------------------------------------
    // Table files
    // ---------------------------------------------------------------------

    /// Creates an empty table file, replacing any existing one.
    pub fn create_table_file(&self, table: &str) -> StorageResult<()> {
        let path = self.table_path(table)?;
        codec::write_file_atomic(FileKind::Table, &path, &Vec::<Record>::new(), self.sync_writes)?;
        Logger::info("TABLE_FILE_CREATED", &[("table", table)]);
        Ok(())
    }

    /// Deletes the table file. Deleting an absent file succeeds.
    pub fn delete_table_file(&self, table: &str) -> StorageResult<()> {
        let path = self.table_path(table)?;
        remove_if_exists(&path, "Failed to delete table file")?;
        Logger::info("TABLE_FILE_DELETED", &[("table", table)]);
        Ok(())
    }

    /// Returns true if the table file exists.
    pub fn table_exists(&self, table: &str) -> bool {
        self.table_path(table).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Reads the full ordered record sequence, tombstones included.
    ///
    /// # Errors
    ///
    /// `TableNotFound` if the file is absent, `Corrupted` if it fails
    /// validation.
    pub fn read_table(&self, table: &str) -> StorageResult<Vec<Record>> {
        let path = self.table_path(table)?;
        codec::read_file(FileKind::Table, &path)?.ok_or_else(|| StorageError::TableNotFound {
            table: table.to_string(),
        })
    }

    /// Atomically replaces the on-disk record sequence.
    pub fn write_table(&self, table: &str, records: &[Record]) -> StorageResult<()> {
        let path = self.table_path(table)?;
        codec::write_file_atomic(FileKind::Table, &path, records, self.sync_writes)
    }

    // ---------------------------------------------------------------------
    // Index files
    // ---------------------------------------------------------------------

    /// Creates an empty index file, replacing any existing one.
    pub fn create_index_file(&self, table: &str, column: &str) -> StorageResult<()> {
        self.write_index(table, column, &IndexMap::new())?;
        Logger::info("INDEX_FILE_CREATED", &[("column", column), ("table", table)]);
        Ok(())
    }

    /// Deletes the index file. Deleting an absent file succeeds.
    pub fn delete_index_file(&self, table: &str, column: &str) -> StorageResult<()> {
        let path = self.index_path(table, column)?;
        remove_if_exists(&path, "Failed to delete index file")?;
        Logger::info("INDEX_FILE_DELETED", &[("column", column), ("table", table)]);
        Ok(())
    }

    /// Returns true if an index file exists for `(table, column)`.
    pub fn index_exists(&self, table: &str, column: &str) -> bool {
        self.index_path(table, column)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Lists the indexed columns of `table`, sorted by name.
    pub fn list_indexes(&self, table: &str) -> StorageResult<Vec<String>> {
        validate_name("table", table)?;
        let dir = self.index_dir.join(table);

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io("Failed to list index directory", &dir, e)),
        };

        let mut columns = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| StorageError::io("Failed to read directory entry", &dir, e))?;
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != INDEX_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                columns.push(stem.to_string());
            }
        }

        columns.sort();
        Ok(columns)
    }

    /// Reads the key → ids mapping of an index.
    ///
    /// # Errors
    ///
    /// `IndexNotFound` if the file is absent.
    pub fn read_index(&self, table: &str, column: &str) -> StorageResult<IndexMap> {
        let path = self.index_path(table, column)?;
        codec::read_file(FileKind::Index, &path)?.ok_or_else(|| StorageError::IndexNotFound {
            table: table.to_string(),
            column: column.to_string(),
        })
    }

    /// Atomically replaces the on-disk index mapping.
    pub fn write_index(&self, table: &str, column: &str, index: &IndexMap) -> StorageResult<()> {
        let path = self.index_path(table, column)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::io("Failed to create index directory", parent, e))?;
        }
        codec::write_file_atomic(FileKind::Index, &path, index, self.sync_writes)
    }

    // ---------------------------------------------------------------------
    // Record lifecycle
    // ---------------------------------------------------------------------

    /// Appends a record and returns its id.
    ///
    /// The id is the table length before the append. This is the only place
    /// record ids are assigned.
    pub fn insert_record(&self, table: &str, mut record: Record) -> StorageResult<RecordId> {
        let mut records = self.read_table(table)?;

        let record_id = records.len() as RecordId;
        record.id = record_id;
        records.push(record);

        self.write_table(table, &records)?;

        Logger::trace(
            "RECORD_INSERTED",
            &[("record_id", &record_id.to_string()), ("table", table)],
        );
        Ok(record_id)
    }

    /// Overwrites the record at `record_id`, re-stamping its id.
    pub fn update_record(
        &self,
        table: &str,
        record_id: RecordId,
        mut record: Record,
    ) -> StorageResult<()> {
        let mut records = self.read_table(table)?;
        let pos = check_record_id(table, record_id, records.len())?;

        record.id = record_id;
        records[pos] = record;

        self.write_table(table, &records)?;

        Logger::trace(
            "RECORD_UPDATED",
            &[("record_id", &record_id.to_string()), ("table", table)],
        );
        Ok(())
    }

    /// Tombstones the record at `record_id`. No compaction happens.
    pub fn delete_record(&self, table: &str, record_id: RecordId) -> StorageResult<()> {
        let mut records = self.read_table(table)?;
        let pos = check_record_id(table, record_id, records.len())?;

        records[pos].deleted = true;

        self.write_table(table, &records)?;

        Logger::trace(
            "RECORD_DELETED",
            &[("record_id", &record_id.to_string()), ("table", table)],
        );
        Ok(())
    }

    /// Returns the live record at `record_id`.
    ///
    /// # Errors
    ///
    /// `InvalidRecordId` if out of range, `RecordDeleted` if tombstoned.
    pub fn get_record(&self, table: &str, record_id: RecordId) -> StorageResult<Record> {
        let mut records = self.read_table(table)?;
        let pos = check_record_id(table, record_id, records.len())?;

        let record = records.swap_remove(pos);
        if record.deleted {
            return Err(StorageError::RecordDeleted {
                table: table.to_string(),
                record_id,
            });
        }
        Ok(record)
    }

    /// Returns all non-tombstoned records in id order.
    pub fn live_records(&self, table: &str) -> StorageResult<Vec<Record>> {
        let records = self.read_table(table)?;
        Ok(records.into_iter().filter(Record::is_live).collect())
    }

    /// Number of non-tombstoned records.
    pub fn live_record_count(&self, table: &str) -> StorageResult<usize> {
        Ok(self.read_table(table)?.iter().filter(|r| r.is_live()).count())
    }

    /// Removes tombstoned records and renumbers the survivors `0..N`.
    ///
    /// Returns the number of records removed. Every index on the table is
    /// stale afterwards and must be rebuilt by the caller.
    pub fn vacuum_table(&self, table: &str) -> StorageResult<usize> {
        let scope = ObservationScope::with_fields("VACUUM", &[("table", table)]);

        let result = self.read_table(table).and_then(|records| {
            let before = records.len();
            let mut active: Vec<Record> = records.into_iter().filter(Record::is_live).collect();
            for (i, record) in active.iter_mut().enumerate() {
                record.id = i as RecordId;
            }
            self.write_table(table, &active)?;
            Ok(before - active.len())
        });

        match &result {
            Ok(removed) => scope.complete_with_fields(&[("removed", &removed.to_string())]),
            Err(e) => scope.fail(&e.to_string()),
        }
        result
    }

    /// Rebuilds an index from scratch by scanning every live record.
    ///
    /// Records whose column holds an array or object are skipped. Returns the
    /// number of record ids indexed.
    pub fn rebuild_index(&self, table: &str, column: &str) -> StorageResult<usize> {
        let records = self.read_table(table)?;

        let mut index = IndexMap::new();
        for record in records.iter().filter(|r| r.is_live()) {
            let value = record.get(column).unwrap_or(&serde_json::Value::Null);
            match IndexKey::from_json(value) {
                Some(key) => index.insert(key, record.id),
                None => Logger::warn(
                    "INDEX_VALUE_SKIPPED",
                    &[
                        ("column", column),
                        ("record_id", &record.id.to_string()),
                        ("table", table),
                    ],
                ),
            }
        }

        self.write_index(table, column, &index)?;

        let indexed = index.id_count();
        Logger::info(
            "INDEX_REBUILT",
            &[
                ("column", column),
                ("keys", &index.key_count().to_string()),
                ("records", &indexed.to_string()),
                ("table", table),
            ],
        );
        Ok(indexed)
    }
}

/// Table and column names: non-empty, ASCII alphanumerics and `_` only.
fn validate_name(kind: &'static str, name: &str) -> StorageResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

fn check_record_id(table: &str, record_id: RecordId, len: usize) -> StorageResult<usize> {
    if record_id < len as RecordId {
        Ok(record_id as usize)
    } else {
        Err(StorageError::InvalidRecordId {
            table: table.to_string(),
            record_id,
            len,
        })
    }
}

fn remove_if_exists(path: &Path, message: &str) -> StorageResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::io(message, path, e)),
    }
}
