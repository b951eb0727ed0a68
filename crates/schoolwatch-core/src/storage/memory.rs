use std::collections::BTreeMap;
use std::sync::RwLock;

use serde_json::Value;

use super::{read_long, read_string, KeyValueStore, StoreError, WriteBatch};

/// Volatile store, used in tests and when no cache directory is available.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::Poisoned)?;
        read_string(&values, key)
    }

    fn get_long(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::Poisoned)?;
        read_long(&values, key)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::Poisoned)?;
        batch.apply_to(&mut values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store
            .commit(WriteBatch::new().put_string("k", "v").put_long("n", -7))
            .unwrap();
        assert_eq!(store.get_string("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.get_long("n").unwrap(), Some(-7));
        assert_eq!(store.len(), 2);

        store.commit(WriteBatch::new().remove("k")).unwrap();
        assert_eq!(store.get_string("k").unwrap(), None);
    }
}
