//! Core library for schoolwatch.
//!
//! Keeps an offline copy of the school directory and decides, on every
//! refresh request, whether to serve the local cache, fetch from the remote
//! database, or refuse because a sync cooldown is active.
//!
//! - `cache`: the local record cache (24 hour TTL) and the per-class cooldown tracker
//! - `sync`: the refresh coordinator that ties them to a remote source
//! - `api`: the HTTP remote source
//! - `storage`: the durable key-value store both caches persist into

pub mod api;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod models;
pub mod storage;
pub mod sync;

pub use api::{ApiError, RealtimeDbClient, RemoteSource, UnconfiguredSource};
pub use cache::{CacheInfo, CooldownStatus, CooldownTracker, LocalCacheStore, SyncClass};
pub use clock::{Clock, ManualClock, SystemClock};
pub use models::{EmergencyContact, Record, School, SchoolStats};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StoreError, WriteBatch};
pub use sync::{FailedFetchPolicy, RefreshCoordinator, RefreshOutcome};
