//! Persistent key → record-id mapping
//!
//! Every key maps to a non-empty list of record ids kept in ascending order.
//! A unique key is simply a one-element list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::keys::IndexKey;
use super::record::RecordId;

/// On-disk entry shape: `{"key": <scalar>, "ids": [..]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: IndexKey,
    pub ids: Vec<RecordId>,
}

/// Contents of one index file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<IndexEntry>", into = "Vec<IndexEntry>")]
pub struct IndexMap {
    /// Maps key values to sorted lists of record ids
    entries: BTreeMap<IndexKey, Vec<RecordId>>,
}

impl IndexMap {
    /// Creates a new empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record id under a key.
    ///
    /// Keeps ids ascending; inserting an id twice is a no-op.
    pub fn insert(&mut self, key: IndexKey, record_id: RecordId) {
        let ids = self.entries.entry(key).or_default();
        if let Err(pos) = ids.binary_search(&record_id) {
            ids.insert(pos, record_id);
        }
    }

    /// Remove a record id from a key.
    ///
    /// Drops the key once its list is empty. Returns whether the id was present.
    pub fn remove(&mut self, key: &IndexKey, record_id: RecordId) -> bool {
        let Some(ids) = self.entries.get_mut(key) else {
            return false;
        };

        let removed = match ids.binary_search(&record_id) {
            Ok(pos) => {
                ids.remove(pos);
                true
            }
            Err(_) => false,
        };

        if ids.is_empty() {
            self.entries.remove(key);
        }
        removed
    }

    /// Ids stored under `key`, ascending. Empty if the key is absent.
    pub fn get(&self, key: &IndexKey) -> &[RecordId] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if the key has at least one id
    pub fn contains_key(&self, key: &IndexKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&IndexKey, &[RecordId])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Iterates entries whose keys fall within `range`, in key order
    pub fn range<R>(&self, range: R) -> impl Iterator<Item = (&IndexKey, &[RecordId])>
    where
        R: std::ops::RangeBounds<IndexKey>,
    {
        self.entries.range(range).map(|(k, v)| (k, v.as_slice()))
    }

    /// Distinct keys in key order
    pub fn keys(&self) -> impl Iterator<Item = &IndexKey> {
        self.entries.keys()
    }

    /// Returns the number of distinct keys
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the total number of record ids
    pub fn id_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<IndexEntry>> for IndexMap {
    fn from(list: Vec<IndexEntry>) -> Self {
        let mut map = IndexMap::new();
        for entry in list {
            for id in entry.ids {
                map.insert(entry.key.clone(), id);
            }
        }
        map
    }
}

impl From<IndexMap> for Vec<IndexEntry> {
    fn from(map: IndexMap) -> Self {
        map.entries
            .into_iter()
            .map(|(key, ids)| IndexEntry { key, ids })
            .collect()
    }
}
