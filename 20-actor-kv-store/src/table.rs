//! The key-value table owned by the store worker.
//!
//! `KvTable` has no synchronization of its own. It is moved into the worker
//! task when the store is spawned and never leaves it, so every access goes
//! through that one task.

use std::collections::HashMap;

use crate::error::{Result, StoreError};

#[derive(Debug)]
pub struct KvTable<V> {
    entries: HashMap<String, V>,
}

impl<V> Default for KvTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> KvTable<V> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Stores a value, overwriting whatever the key held before.
    pub fn put(&mut self, key: String, value: V) {
        self.entries.insert(key, value);
    }

    /// Removes a key. Removing a key that is not present is a no-op.
    pub fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> KvTable<V> {
    /// Returns a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Result<V> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_not_found() {
        let table: KvTable<String> = KvTable::new();
        assert_eq!(
            table.get("missing"),
            Err(StoreError::NotFound {
                key: "missing".into()
            })
        );
    }

    #[test]
    fn put_then_get_returns_value() {
        let mut table = KvTable::new();
        table.put("a".into(), "1".to_string());
        assert_eq!(table.get("a"), Ok("1".to_string()));
    }

    #[test]
    fn last_write_wins() {
        let mut table = KvTable::new();
        table.put("a".into(), 1);
        table.put("a".into(), 2);
        assert_eq!(table.get("a"), Ok(2));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn delete_absent_key_leaves_table_unchanged() {
        let mut table = KvTable::new();
        table.put("kept".into(), 7);
        table.delete("absent");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("kept"), Ok(7));
    }

    #[test]
    fn delete_removes_key() {
        let mut table = KvTable::new();
        table.put("a".into(), "1".to_string());
        table.delete("a");
        assert!(table.is_empty());
        assert!(matches!(table.get("a"), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn empty_key_is_a_regular_key() {
        let mut table = KvTable::new();
        table.put(String::new(), "blank".to_string());
        assert_eq!(table.get(""), Ok("blank".to_string()));
    }
}
