use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{Clock, MILLIS_PER_HOUR, MILLIS_PER_MINUTE};
use crate::models::Record;
use crate::storage::{KeyValueStore, StoreError, WriteBatch};

/// Cached records expire 24 hours after the sync that wrote them.
pub const CACHE_TTL_HOURS: i64 = 24;
pub const CACHE_TTL_MILLIS: i64 = CACHE_TTL_HOURS * MILLIS_PER_HOUR;

/// Snapshot of the cache state for a "last synced" indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CacheInfo {
    pub has_data: bool,
    /// 0 when never synced
    pub last_sync_millis: i64,
    pub is_expired: bool,
}

impl CacheInfo {
    pub fn age_minutes(&self, now_millis: i64) -> Option<i64> {
        if self.last_sync_millis <= 0 {
            return None;
        }
        Some(now_millis.saturating_sub(self.last_sync_millis) / MILLIS_PER_MINUTE)
    }

    pub fn age_display(&self, now_millis: i64) -> String {
        let minutes = match self.age_minutes(now_millis) {
            Some(minutes) => minutes,
            None => return "never".to_string(),
        };
        if minutes < 1 {
            // Also covers clock skew into the future
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            let remaining_mins = minutes % 60;
            if remaining_mins >= 30 {
                // Round up: 1h 30m+ becomes 2h
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            let remaining_hours = (minutes % 1440) / 60;
            if remaining_hours >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// The most recent full record set of one collection.
///
/// Every operation is infallible from the caller's point of view: storage
/// and decoding failures are logged and read as "no cache".
pub struct LocalCacheStore<R> {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    records_key: String,
    last_sync_key: String,
    _records: PhantomData<fn() -> R>,
}

impl<R> Clone for LocalCacheStore<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            records_key: self.records_key.clone(),
            last_sync_key: self.last_sync_key.clone(),
            _records: PhantomData,
        }
    }
}

impl<R: Record> LocalCacheStore<R> {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            records_key: format!("{}_cache", R::COLLECTION),
            last_sync_key: format!("{}_last_sync", R::COLLECTION),
            _records: PhantomData,
        }
    }

    /// Replace the cached set with `records`, stamped with the current time.
    /// On failure the previous entry stays as it was.
    pub fn save(&self, records: &[R]) {
        match self.try_save(records) {
            Ok(()) => info!(collection = R::COLLECTION, count = records.len(), "Cached records"),
            Err(e) => warn!(collection = R::COLLECTION, error = %e, "Failed to cache records"),
        }
    }

    fn try_save(&self, records: &[R]) -> Result<(), StoreError> {
        let contents = serde_json::to_string(records)?;
        let batch = WriteBatch::new()
            .put_string(self.records_key.as_str(), contents)
            .put_long(self.last_sync_key.as_str(), self.clock.now_millis());
        self.store.commit(batch)
    }

    /// Records from the last successful save, or an empty list.
    pub fn load(&self) -> Vec<R> {
        match self.read_records() {
            Some(records) => {
                debug!(collection = R::COLLECTION, count = records.len(), "Loaded records from cache");
                records
            }
            None => Vec::new(),
        }
    }

    /// The decoded payload, or `None` when it is missing, unreadable or corrupt.
    fn read_records(&self) -> Option<Vec<R>> {
        let contents = match self.store.get_string(&self.records_key) {
            Ok(Some(contents)) if !contents.is_empty() => contents,
            Ok(_) => return None,
            Err(e) => {
                warn!(collection = R::COLLECTION, error = %e, "Failed to read cache");
                return None;
            }
        };

        match serde_json::from_str::<Vec<R>>(&contents) {
            Ok(records) => Some(records),
            Err(e) => {
                warn!(collection = R::COLLECTION, error = %e, "Failed to parse cache");
                None
            }
        }
    }

    fn last_sync_millis(&self) -> Result<i64, StoreError> {
        Ok(self.store.get_long(&self.last_sync_key)?.unwrap_or(0))
    }

    /// True when never synced or when the last sync is at least a TTL old.
    /// A zero, negative or otherwise unusable timestamp is never fresh.
    pub fn is_expired(&self) -> bool {
        match self.last_sync_millis() {
            Ok(last_sync) if last_sync <= 0 => true,
            Ok(last_sync) => match self.clock.now_millis().checked_sub(last_sync) {
                Some(age) => age >= CACHE_TTL_MILLIS,
                None => true,
            },
            Err(e) => {
                debug!(collection = R::COLLECTION, error = %e, "Failed to read sync time, treating cache as expired");
                true
            }
        }
    }

    pub fn info(&self) -> CacheInfo {
        CacheInfo {
            has_data: self.read_records().is_some(),
            last_sync_millis: self.last_sync_millis().unwrap_or(0),
            is_expired: self.is_expired(),
        }
    }

    pub fn clear(&self) {
        let batch = WriteBatch::new()
            .remove(self.records_key.as_str())
            .remove(self.last_sync_key.as_str());
        match self.store.commit(batch) {
            Ok(()) => info!(collection = R::COLLECTION, "Cache cleared"),
            Err(e) => warn!(collection = R::COLLECTION, error = %e, "Failed to clear cache"),
        }
    }

    /// Backdate the sync time past the TTL, keeping the records.
    pub fn expire(&self) {
        let expired_at = self
            .clock
            .now_millis()
            .saturating_sub(CACHE_TTL_MILLIS + MILLIS_PER_HOUR);
        let batch = WriteBatch::new().put_long(self.last_sync_key.as_str(), expired_at);
        if let Err(e) = self.store.commit(batch) {
            warn!(collection = R::COLLECTION, error = %e, "Failed to expire cache");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
