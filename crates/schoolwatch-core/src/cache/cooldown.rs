use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{Clock, MILLIS_PER_MINUTE};
use crate::storage::{KeyValueStore, StoreError, WriteBatch};

/// Minimum interval between two remote fetches of the same sync class.
pub const COOLDOWN_MINUTES: i64 = 30;
pub const COOLDOWN_MILLIS: i64 = COOLDOWN_MINUTES * MILLIS_PER_MINUTE;

/// An independently throttled kind of remote fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum SyncClass {
    /// Bulk refresh of the school directory
    Schools,
    /// Emergency contact reference data
    Emergency,
}

impl SyncClass {
    pub const ALL: [SyncClass; 2] = [SyncClass::Schools, SyncClass::Emergency];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncClass::Schools => "schools",
            SyncClass::Emergency => "emergency",
        }
    }

    fn storage_key(&self) -> &'static str {
        match self {
            SyncClass::Schools => "last_school_sync_time",
            SyncClass::Emergency => "last_emergency_sync_time",
        }
    }
}

impl fmt::Display for SyncClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "schools" | "school" => Ok(SyncClass::Schools),
            "emergency" => Ok(SyncClass::Emergency),
            other => Err(format!("unknown sync class '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CooldownStatus {
    pub class: SyncClass,
    pub can_sync: bool,
    pub minutes_remaining: i64,
}

/// Remembers when each sync class last fetched from the remote.
///
/// Read failures fail closed: the class is reported as cooling down for the
/// full window.
#[derive(Clone)]
pub struct CooldownTracker {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl CooldownTracker {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Milliseconds since the last attempt, `None` if there never was a
    /// valid one.
    fn elapsed_millis(&self, class: SyncClass) -> Result<Option<i64>, StoreError> {
        match self.store.get_long(class.storage_key())? {
            None => Ok(None),
            Some(last_attempt) if last_attempt <= 0 => {
                if last_attempt < 0 {
                    warn!(class = %class, last_attempt, "Ignoring negative sync attempt time");
                }
                Ok(None)
            }
            // A timestamp ahead of the clock counts as "just now"
            Some(last_attempt) => Ok(Some(
                self.clock.now_millis().saturating_sub(last_attempt).max(0),
            )),
        }
    }

    pub fn can_sync(&self, class: SyncClass) -> bool {
        match self.elapsed_millis(class) {
            Ok(None) => true,
            Ok(Some(elapsed)) => elapsed >= COOLDOWN_MILLIS,
            Err(e) => {
                warn!(class = %class, error = %e, "Failed to read cooldown, refusing sync");
                false
            }
        }
    }

    /// Whole minutes until the next fetch is allowed, 0 if it already is.
    pub fn minutes_remaining(&self, class: SyncClass) -> i64 {
        match self.elapsed_millis(class) {
            Ok(None) => 0,
            Ok(Some(elapsed)) => (COOLDOWN_MINUTES - elapsed / MILLIS_PER_MINUTE).max(0),
            Err(_) => COOLDOWN_MINUTES,
        }
    }

    /// Start a new cooldown window for `class`. Only call this for a fetch
    /// that was actually started.
    pub fn record_attempt(&self, class: SyncClass) {
        let now = self.clock.now_millis();
        match self
            .store
            .commit(WriteBatch::new().put_long(class.storage_key(), now))
        {
            Ok(()) => debug!(class = %class, at = now, "Recorded sync attempt"),
            Err(e) => warn!(class = %class, error = %e, "Failed to record sync attempt"),
        }
    }

    pub fn reset(&self, classes: &[SyncClass]) {
        let batch = classes
            .iter()
            .fold(WriteBatch::new(), |batch, class| batch.remove(class.storage_key()));
        match self.store.commit(batch) {
            Ok(()) => info!(?classes, "Cooldown reset"),
            Err(e) => warn!(?classes, error = %e, "Failed to reset cooldown"),
        }
    }

    pub fn reset_all(&self) {
        self.reset(&SyncClass::ALL);
    }

    pub fn status(&self, class: SyncClass) -> CooldownStatus {
        CooldownStatus {
            class,
            can_sync: self.can_sync(class),
            minutes_remaining: self.minutes_remaining(class),
        }
    }
}
