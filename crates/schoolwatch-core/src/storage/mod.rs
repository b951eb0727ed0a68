//! Durable key-value storage.
//!
//! Both the record cache and the cooldown tracker persist through the
//! `KeyValueStore` trait. Values are either text or 64-bit integers, and a
//! `WriteBatch` is applied all-or-nothing.
//!
//! - `FileStore`: one JSON document per namespace, replaced atomically on commit
//! - `MemoryStore`: the same semantics without persistence

pub mod file;
pub mod memory;

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Value for key '{0}' has an unexpected type")]
    TypeMismatch(String),

    #[error("Storage lock poisoned")]
    Poisoned,
}

pub trait KeyValueStore: Send + Sync {
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn get_long(&self, key: &str) -> Result<Option<i64>, StoreError>;

    /// Apply every edit in `batch`, or none of them.
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
enum Edit {
    Put(String, Value),
    Remove(String),
}

/// A set of edits committed together.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    edits: Vec<Edit>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.edits
            .push(Edit::Put(key.into(), Value::String(value.into())));
        self
    }

    pub fn put_long(mut self, key: impl Into<String>, value: i64) -> Self {
        self.edits.push(Edit::Put(key.into(), Value::from(value)));
        self
    }

    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.edits.push(Edit::Remove(key.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub(crate) fn apply_to(self, map: &mut BTreeMap<String, Value>) {
        for edit in self.edits {
            match edit {
                Edit::Put(key, value) => {
                    map.insert(key, value);
                }
                Edit::Remove(key) => {
                    map.remove(&key);
                }
            }
        }
    }
}

pub(crate) fn read_string(
    map: &BTreeMap<String, Value>,
    key: &str,
) -> Result<Option<String>, StoreError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(StoreError::TypeMismatch(key.to_string())),
    }
}

pub(crate) fn read_long(map: &BTreeMap<String, Value>, key: &str) -> Result<Option<i64>, StoreError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| StoreError::TypeMismatch(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_batch_applies_in_order() {
        let mut map = BTreeMap::new();
        WriteBatch::new()
            .put_long("a", 1)
            .put_string("b", "x")
            .remove("a")
            .put_long("c", 3)
            .apply_to(&mut map);

        assert!(!map.contains_key("a"));
        assert_eq!(read_string(&map, "b").unwrap().as_deref(), Some("x"));
        assert_eq!(read_long(&map, "c").unwrap(), Some(3));
    }

    #[test]
    fn test_read_type_mismatch() {
        let mut map = BTreeMap::new();
        WriteBatch::new().put_string("ts", "soon").apply_to(&mut map);

        assert!(matches!(
            read_long(&map, "ts"),
            Err(StoreError::TypeMismatch(ref key)) if key == "ts"
        ));
        assert_eq!(read_long(&map, "missing").unwrap(), None);
    }
}
