use std::sync::atomic::{AtomicBool, Ordering};

use schoolwatch_core::{KeyValueStore, MemoryStore, StoreError, WriteBatch};

// ============================================================================
// KeyValueStore with switchable failures
// ============================================================================

/// Wraps a `MemoryStore`; reads and writes can be made to fail independently.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FailingStore {
    /// Every read and every write fails.
    pub fn broken() -> Self {
        let store = Self::default();
        store.set_fail_reads(true);
        store.set_fail_writes(true);
        store
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk unavailable")));
        }
        Ok(())
    }
}

impl KeyValueStore for FailingStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::check(&self.fail_reads)?;
        self.inner.get_string(key)
    }

    fn get_long(&self, key: &str) -> Result<Option<i64>, StoreError> {
        Self::check(&self.fail_reads)?;
        self.inner.get_long(key)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.commit(batch)
    }
}
