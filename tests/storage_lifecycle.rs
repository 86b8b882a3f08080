//! Storage Lifecycle Tests
//!
//! Tests for storage invariants:
//! - Record ids are positions and never change outside vacuum
//! - Deletes tombstone, they do not compact
//! - Vacuum drops tombstones and renumbers survivors
//! - Corrupted files are detected, never silently read

use reldb::storage::{Record, StorageManager};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn open_storage(dir: &TempDir) -> StorageManager {
    StorageManager::open(dir.path())
        .unwrap()
        .with_sync_writes(false)
}

fn record(name: &str) -> Record {
    Record::from_json(json!({ "name": name })).unwrap()
}

fn names(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.get("name").and_then(|v| v.as_str()).unwrap().to_string())
        .collect()
}

// =============================================================================
// Record Id Tests
// =============================================================================

/// Ids are assigned in insertion order starting at zero.
#[test]
fn test_ids_are_positions() {
    let dir = TempDir::new().unwrap();
    let storage = open_storage(&dir);
    storage.create_table_file("people").unwrap();

    for (expected, name) in ["a", "b", "c"].iter().enumerate() {
        let id = storage.insert_record("people", record(name)).unwrap();
        assert_eq!(id, expected as u64);
    }

    let all = storage.read_table("people").unwrap();
    for (pos, r) in all.iter().enumerate() {
        assert_eq!(r.id, pos as u64);
    }
}

/// Deleting a record leaves every other id untouched.
#[test]
fn test_delete_keeps_ids_stable() {
    let dir = TempDir::new().unwrap();
    let storage = open_storage(&dir);
    storage.create_table_file("people").unwrap();
    for name in ["a", "b", "c"] {
        storage.insert_record("people", record(name)).unwrap();
    }

    storage.delete_record("people", 1).unwrap();

    assert_eq!(storage.read_table("people").unwrap().len(), 3);
    assert_eq!(
        storage.get_record("people", 2).unwrap().get("name"),
        Some(&json!("c"))
    );
    assert_eq!(
        storage.get_record("people", 1).unwrap_err().code(),
        "RDB_STORAGE_RECORD_DELETED"
    );
    assert_eq!(storage.live_record_count("people").unwrap(), 2);

    // New inserts still append after the tombstone
    assert_eq!(storage.insert_record("people", record("d")).unwrap(), 3);
}

/// Out-of-range ids are rejected for every record operation.
#[test]
fn test_invalid_record_id() {
    let dir = TempDir::new().unwrap();
    let storage = open_storage(&dir);
    storage.create_table_file("people").unwrap();
    storage.insert_record("people", record("a")).unwrap();

    for err in [
        storage.get_record("people", 5).unwrap_err(),
        storage.delete_record("people", 5).unwrap_err(),
        storage.update_record("people", 5, record("x")).unwrap_err(),
    ] {
        assert_eq!(err.code(), "RDB_STORAGE_INVALID_RECORD_ID");
    }
}

/// Updating a tombstoned record brings it back.
#[test]
fn test_update_resurrects_tombstone() {
    let dir = TempDir::new().unwrap();
    let storage = open_storage(&dir);
    storage.create_table_file("people").unwrap();
    storage.insert_record("people", record("a")).unwrap();
    storage.delete_record("people", 0).unwrap();

    storage.update_record("people", 0, record("b")).unwrap();

    let r = storage.get_record("people", 0).unwrap();
    assert_eq!(r.id, 0);
    assert_eq!(r.get("name"), Some(&json!("b")));
}

// =============================================================================
// Vacuum Tests
// =============================================================================

/// Vacuum keeps live records in order and renumbers them densely.
#[test]
fn test_vacuum_compacts_and_renumbers() {
    let dir = TempDir::new().unwrap();
    let storage = open_storage(&dir);
    storage.create_table_file("people").unwrap();
    for name in ["a", "b", "c", "d", "e"] {
        storage.insert_record("people", record(name)).unwrap();
    }
    storage.delete_record("people", 0).unwrap();
    storage.delete_record("people", 3).unwrap();

    let removed = storage.vacuum_table("people").unwrap();
    assert_eq!(removed, 2);

    let all = storage.read_table("people").unwrap();
    assert_eq!(names(&all), vec!["b", "c", "e"]);
    for (pos, r) in all.iter().enumerate() {
        assert_eq!(r.id, pos as u64);
        assert!(r.is_live());
    }

    // Nothing left to remove
    assert_eq!(storage.vacuum_table("people").unwrap(), 0);
}

/// Vacuum of a missing table fails without creating it.
#[test]
fn test_vacuum_missing_table() {
    let dir = TempDir::new().unwrap();
    let storage = open_storage(&dir);

    let err = storage.vacuum_table("ghost").unwrap_err();
    assert_eq!(err.code(), "RDB_STORAGE_TABLE_NOT_FOUND");
    assert!(!storage.table_exists("ghost"));
}

// =============================================================================
// Persistence and Corruption Tests
// =============================================================================

/// Records survive reopening the storage.
#[test]
fn test_reopen_preserves_records() {
    let dir = TempDir::new().unwrap();
    {
        let storage = open_storage(&dir);
        storage.create_table_file("people").unwrap();
        storage.insert_record("people", record("a")).unwrap();
        storage.insert_record("people", record("b")).unwrap();
        storage.delete_record("people", 0).unwrap();
    }

    let storage = open_storage(&dir);
    let live = storage.live_records("people").unwrap();
    assert_eq!(names(&live), vec!["b"]);
    assert_eq!(live[0].id, 1);
}

/// A flipped body byte fails the checksum.
#[test]
fn test_corrupted_table_detected() {
    let dir = TempDir::new().unwrap();
    let storage = open_storage(&dir);
    storage.create_table_file("people").unwrap();
    storage.insert_record("people", record("alice")).unwrap();

    let path = storage.table_path("people").unwrap();
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 2;
    bytes[last] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let err = storage.read_table("people").unwrap_err();
    assert_eq!(err.code(), "RDB_STORAGE_CORRUPTED");
}

/// A truncated file is rejected.
#[test]
fn test_truncated_table_detected() {
    let dir = TempDir::new().unwrap();
    let storage = open_storage(&dir);
    storage.create_table_file("people").unwrap();
    storage.insert_record("people", record("alice")).unwrap();

    let path = storage.table_path("people").unwrap();
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let err = storage.read_table("people").unwrap_err();
    assert_eq!(err.code(), "RDB_STORAGE_CORRUPTED");
}

/// No temp files are left behind after writes.
#[test]
fn test_no_temp_files_after_write() {
    let dir = TempDir::new().unwrap();
    let storage = open_storage(&dir);
    storage.create_table_file("people").unwrap();
    for name in ["a", "b"] {
        storage.insert_record("people", record(name)).unwrap();
    }

    let leftovers: Vec<_> = fs::read_dir(dir.path().join("data"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left: {:?}", leftovers);
}
