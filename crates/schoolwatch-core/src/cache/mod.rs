//! Local persistence for offline access and sync throttling.
//!
//! - `LocalCacheStore`: the last full record set of one collection plus the
//!   time it was synced. Considered expired after 24 hours.
//! - `CooldownTracker`: the time of the last remote fetch per sync class.
//!   A new fetch is allowed 30 minutes after the previous one.
//!
//! The two are persisted in separate namespaces. Clearing one never touches
//! the other.

pub mod cooldown;
pub mod store;

pub use cooldown::{CooldownStatus, CooldownTracker, SyncClass, COOLDOWN_MILLIS, COOLDOWN_MINUTES};
pub use store::{CacheInfo, LocalCacheStore, CACHE_TTL_HOURS, CACHE_TTL_MILLIS};

/// Storage namespace of the record cache
pub const CACHE_NAMESPACE: &str = "record_cache";

/// Storage namespace of the cooldown tracker
pub const COOLDOWN_NAMESPACE: &str = "sync_cooldown";
