//! Table record type
//!
//! A record is an ordered column → value mapping plus two reserved fields
//! owned by the storage layer:
//!
//! - `__id__`: position of the record in its table file
//! - `__deleted__`: tombstone flag (absent or false means live)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved field holding the record id.
pub const ID_FIELD: &str = "__id__";
/// Reserved field holding the tombstone flag.
pub const DELETED_FIELD: &str = "__deleted__";

/// Identifier of a record within its table.
pub type RecordId = u64;

/// A single table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Position-stable id, stamped by the storage manager
    #[serde(rename = "__id__", default)]
    pub id: RecordId,
    /// Tombstone flag
    #[serde(rename = "__deleted__", default, skip_serializing_if = "is_false")]
    pub deleted: bool,
    /// User columns
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl Record {
    /// Creates a live record from user columns.
    ///
    /// Reserved fields present in `fields` are dropped; the storage manager
    /// owns them.
    pub fn new(mut fields: Map<String, Value>) -> Self {
        fields.remove(ID_FIELD);
        fields.remove(DELETED_FIELD);
        Self {
            id: 0,
            deleted: false,
            fields,
        }
    }

    /// Creates a record from a JSON object. Non-object values yield `None`.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::new(map)),
            _ => None,
        }
    }

    /// Returns the value of a column, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Returns true unless the record is tombstoned.
    pub fn is_live(&self) -> bool {
        !self.deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reserved_fields_serialized() {
        let mut record = Record::from_json(json!({"name": "Alice", "age": 30})).unwrap();
        record.id = 4;

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["__id__"], 4);
        assert_eq!(value["name"], "Alice");
        // Live records omit the tombstone flag
        assert!(value.get("__deleted__").is_none());

        record.deleted = true;
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["__deleted__"], true);
    }

    #[test]
    fn test_missing_tombstone_means_live() {
        let record: Record = serde_json::from_value(json!({"__id__": 2, "x": 1})).unwrap();
        assert_eq!(record.id, 2);
        assert!(record.is_live());
        assert_eq!(record.get("x"), Some(&json!(1)));
        assert!(record.get("__id__").is_none());
    }

    #[test]
    fn test_user_cannot_set_reserved_fields() {
        let record = Record::from_json(json!({"__id__": 99, "__deleted__": true, "a": 1})).unwrap();
        assert_eq!(record.id, 0);
        assert!(record.is_live());
        assert_eq!(record.fields.len(), 1);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(Record::from_json(json!([1, 2])).is_none());
    }
}
