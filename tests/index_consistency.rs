//! Index Consistency Tests
//!
//! Tests for index invariants:
//! - Incremental maintenance produces the same index as a rebuild
//! - Lookups and range lookups agree with a table scan
//! - Indexes are rebuilt correctly after vacuum

use reldb::index::{ComparisonOp, IndexKey, IndexManager};
use reldb::storage::{Record, RecordId, StorageManager};
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn open_manager(dir: &TempDir) -> IndexManager {
    let storage = StorageManager::open(dir.path())
        .unwrap()
        .with_sync_writes(false);
    IndexManager::new(storage)
}

fn key(value: &Value) -> IndexKey {
    IndexKey::from_json(value).unwrap()
}

/// Inserts a record and maintains the `age` index by hand.
fn insert(manager: &IndexManager, age: i64) -> RecordId {
    let id = manager
        .storage()
        .insert_record("people", Record::from_json(json!({ "age": age })).unwrap())
        .unwrap();
    manager
        .update_index("people", "age", &IndexKey::Int(age), id, None)
        .unwrap();
    id
}

fn setup(dir: &TempDir, ages: &[i64]) -> IndexManager {
    let manager = open_manager(dir);
    manager.storage().create_table_file("people").unwrap();
    manager.create_index("people", "age").unwrap();
    for age in ages {
        insert(&manager, *age);
    }
    manager
}

fn sorted(mut ids: Vec<RecordId>) -> Vec<RecordId> {
    ids.sort_unstable();
    ids
}

// =============================================================================
// Maintenance Tests
// =============================================================================

/// Inserts, updates and deletes applied one at a time match a rebuild.
#[test]
fn test_incremental_matches_rebuild() {
    let dir = TempDir::new().unwrap();
    let manager = setup(&dir, &[30, 25, 30, 40]);
    let storage = manager.storage();

    // 25 -> 35
    storage
        .update_record("people", 1, Record::from_json(json!({ "age": 35 })).unwrap())
        .unwrap();
    manager
        .update_index("people", "age", &IndexKey::Int(35), 1, Some(&IndexKey::Int(25)))
        .unwrap();

    // drop the 40
    storage.delete_record("people", 3).unwrap();
    manager
        .delete_from_index("people", "age", &IndexKey::Int(40), 3)
        .unwrap();

    let incremental = storage.read_index("people", "age").unwrap();
    manager.rebuild_index("people", "age").unwrap();
    let rebuilt = storage.read_index("people", "age").unwrap();

    assert_eq!(incremental, rebuilt);
    assert_eq!(
        manager.get_all_keys("people", "age").unwrap(),
        vec![IndexKey::Int(30), IndexKey::Int(35)]
    );
}

/// Rebuilding twice yields identical files.
#[test]
fn test_rebuild_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let manager = setup(&dir, &[3, 1, 2, 1]);

    manager.rebuild_index("people", "age").unwrap();
    let first = std::fs::read(manager.storage().index_path("people", "age").unwrap()).unwrap();
    manager.rebuild_index("people", "age").unwrap();
    let second = std::fs::read(manager.storage().index_path("people", "age").unwrap()).unwrap();

    assert_eq!(first, second);
}

/// After vacuum, rebuilt indexes point at the renumbered ids.
#[test]
fn test_rebuild_all_after_vacuum() {
    let dir = TempDir::new().unwrap();
    let manager = setup(&dir, &[10, 20, 30]);
    manager.storage().delete_record("people", 0).unwrap();

    manager.storage().vacuum_table("people").unwrap();
    let rebuilt = manager.rebuild_all("people").unwrap();
    assert_eq!(rebuilt, vec!["age".to_string()]);

    assert_eq!(
        manager
            .lookup("people", "age", &IndexKey::Int(20), ComparisonOp::Eq)
            .unwrap(),
        vec![0]
    );
    assert_eq!(
        manager
            .lookup("people", "age", &IndexKey::Int(30), ComparisonOp::Eq)
            .unwrap(),
        vec![1]
    );
    assert!(manager
        .lookup("people", "age", &IndexKey::Int(10), ComparisonOp::Eq)
        .unwrap()
        .is_empty());
}

/// Operations on a missing index fail with a not-found error.
#[test]
fn test_missing_index() {
    let dir = TempDir::new().unwrap();
    let manager = open_manager(&dir);

    let err = manager
        .lookup("people", "age", &IndexKey::Int(1), ComparisonOp::Eq)
        .unwrap_err();
    assert_eq!(err.code(), "RDB_INDEX_NOT_FOUND");
    assert!(!manager.index_exists("people", "age"));
}

// =============================================================================
// Lookup Tests
// =============================================================================

/// Every comparison operator agrees with a scan of the table.
#[test]
fn test_lookup_matches_scan() {
    let dir = TempDir::new().unwrap();
    let ages = [5, 12, 12, 7, 30, 18];
    let manager = setup(&dir, &ages);
    let pivot = IndexKey::Int(12);

    let ops = [
        ComparisonOp::Eq,
        ComparisonOp::NotEq,
        ComparisonOp::Lt,
        ComparisonOp::Le,
        ComparisonOp::Gt,
        ComparisonOp::Ge,
    ];
    for op in ops {
        let expected: Vec<RecordId> = manager
            .storage()
            .live_records("people")
            .unwrap()
            .iter()
            .filter(|r| op.matches(key(r.get("age").unwrap()).cmp(&pivot)))
            .map(|r| r.id)
            .collect();

        let found = sorted(manager.lookup("people", "age", &pivot, op).unwrap());
        assert_eq!(found, expected, "operator {}", op);
    }
}

/// Range bounds are honored both inclusively and exclusively.
#[test]
fn test_range_lookup() {
    let dir = TempDir::new().unwrap();
    let manager = setup(&dir, &[10, 20, 30, 40, 50]);

    let inclusive = manager
        .range_lookup("people", "age", &IndexKey::Int(20), &IndexKey::Int(40), true)
        .unwrap();
    assert_eq!(sorted(inclusive), vec![1, 2, 3]);

    let exclusive = manager
        .range_lookup("people", "age", &IndexKey::Int(20), &IndexKey::Int(40), false)
        .unwrap();
    assert_eq!(exclusive, vec![2]);
}

/// Inverted and empty ranges return nothing.
#[test]
fn test_degenerate_ranges() {
    let dir = TempDir::new().unwrap();
    let manager = setup(&dir, &[10, 20, 30]);

    let inverted = manager
        .range_lookup("people", "age", &IndexKey::Int(30), &IndexKey::Int(10), true)
        .unwrap();
    assert!(inverted.is_empty());

    let empty = manager
        .range_lookup("people", "age", &IndexKey::Int(20), &IndexKey::Int(20), false)
        .unwrap();
    assert!(empty.is_empty());

    let point = manager
        .range_lookup("people", "age", &IndexKey::Int(20), &IndexKey::Int(20), true)
        .unwrap();
    assert_eq!(point, vec![1]);
}

/// Key count counts distinct values, not rows.
#[test]
fn test_key_count_is_distinct_values() {
    let dir = TempDir::new().unwrap();
    let manager = setup(&dir, &[1, 1, 1, 2]);

    assert_eq!(manager.get_key_count("people", "age").unwrap(), 2);
    assert_eq!(
        manager
            .lookup("people", "age", &IndexKey::Int(1), ComparisonOp::Eq)
            .unwrap(),
        vec![0, 1, 2]
    );
}
