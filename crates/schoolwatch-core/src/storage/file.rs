use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;
use tracing::{debug, warn};

use super::{read_long, read_string, KeyValueStore, StoreError, WriteBatch};

/// A namespace persisted as a single JSON document.
///
/// The document is mirrored in memory. A commit writes the whole updated
/// document to a temporary sibling and renames it into place, so a reader of
/// the file sees either the old document or the new one. The in-memory view
/// only changes once the rename succeeded.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, Value>>,
}

impl FileStore {
    pub fn open(dir: &Path, namespace: &str) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", namespace));

        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            match serde_json::from_str(&contents) {
                Ok(values) => values,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupt store document, starting empty");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), keys = values.len(), "Opened file store");

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let contents = serde_json::to_vec_pretty(values)?;
        let tmp_path = self.path.with_extension("json.tmp");
        if let Err(e) = write_synced(&tmp_path, &contents) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Write `contents` and flush them to the device before returning.
fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

impl KeyValueStore for FileStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::Poisoned)?;
        read_string(&values, key)
    }

    fn get_long(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::Poisoned)?;
        read_long(&values, key)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut values = self.values.write().map_err(|_| StoreError::Poisoned)?;
        let mut updated = values.clone();
        batch.apply_to(&mut updated);
        self.persist(&updated)?;
        *values = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path(), "prefs").unwrap();
            store
                .commit(
                    WriteBatch::new()
                        .put_string("schools_cache", "[]")
                        .put_long("schools_last_sync", 1_700_000_000_000),
                )
                .unwrap();
        }

        let reopened = FileStore::open(dir.path(), "prefs").unwrap();
        assert_eq!(
            reopened.get_string("schools_cache").unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(
            reopened.get_long("schools_last_sync").unwrap(),
            Some(1_700_000_000_000)
        );
        assert!(!dir.path().join("prefs.json.tmp").exists());
    }

    #[test]
    fn test_file_store_corrupt_document_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("prefs.json"), "{not json").unwrap();

        let store = FileStore::open(dir.path(), "prefs").unwrap();
        assert_eq!(store.get_string("anything").unwrap(), None);
    }

    #[test]
    fn test_file_store_failed_commit_keeps_previous_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), "prefs").unwrap();
        store.commit(WriteBatch::new().put_long("ts", 1)).unwrap();

        // A directory squatting on the temp path makes the write fail.
        std::fs::create_dir(dir.path().join("prefs.json.tmp")).unwrap();
        let result = store.commit(WriteBatch::new().put_long("ts", 2));

        assert!(result.is_err());
        assert_eq!(store.get_long("ts").unwrap(), Some(1));
        let on_disk = std::fs::read_to_string(store.path()).unwrap();
        assert!(on_disk.contains("\"ts\": 1"));
    }

    #[test]
    fn test_commit_replaces_stale_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // Left behind by a write that never reached the rename
        std::fs::write(dir.path().join("prefs.json.tmp"), "{\"ts\": 99, \"half").unwrap();

        let store = FileStore::open(dir.path(), "prefs").unwrap();
        store.commit(WriteBatch::new().put_long("ts", 1)).unwrap();

        assert!(!dir.path().join("prefs.json.tmp").exists());
        let reopened = FileStore::open(dir.path(), "prefs").unwrap();
        assert_eq!(reopened.get_long("ts").unwrap(), Some(1));
    }

    #[test]
    fn test_write_synced_writes_whole_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        write_synced(&path, b"{\"a\": 1}").unwrap();
        write_synced(&path, b"{}").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_file_stores_are_independent_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileStore::open(dir.path(), "record_cache").unwrap();
        let cooldown = FileStore::open(dir.path(), "sync_cooldown").unwrap();

        cache.commit(WriteBatch::new().put_long("k", 1)).unwrap();
        assert_eq!(cooldown.get_long("k").unwrap(), None);
    }
}
