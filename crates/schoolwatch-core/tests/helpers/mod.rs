#![allow(dead_code)]

pub mod failing_store;
pub mod mock_remote;

use std::sync::Arc;

use schoolwatch_core::cache::{CooldownTracker, LocalCacheStore, SyncClass};
use schoolwatch_core::{KeyValueStore, ManualClock, MemoryStore, RefreshCoordinator, School};

pub use failing_store::FailingStore;
pub use mock_remote::MockRemote;

/// 2023-11-14T22:13:20Z
pub const T0: i64 = 1_700_000_000_000;

pub fn make_school(id: &str) -> School {
    School {
        id: id.to_string(),
        school_number: id.to_string(),
        school_name: format!("Government Primary School {}", id),
        school_status: "good".to_string(),
        total_students: 200,
        daily_attendance: 180,
        ..Default::default()
    }
}

pub fn make_schools(count: usize) -> Vec<School> {
    (1..=count).map(|i| make_school(&format!("{:03}", i))).collect()
}

pub struct Fixture {
    pub clock: Arc<ManualClock>,
    pub cache_store: Arc<MemoryStore>,
    pub cooldown_store: Arc<MemoryStore>,
    pub cache: LocalCacheStore<School>,
    pub cooldown: CooldownTracker,
    pub remote: Arc<MockRemote<School>>,
    pub coordinator: RefreshCoordinator<School>,
}

impl Fixture {
    pub fn new(remote: MockRemote<School>) -> Self {
        let clock = Arc::new(ManualClock::new(T0));
        let cache_store = Arc::new(MemoryStore::new());
        let cooldown_store = Arc::new(MemoryStore::new());
        let cache = LocalCacheStore::new(cache_store.clone(), clock.clone());
        let cooldown = CooldownTracker::new(cooldown_store.clone(), clock.clone());
        let remote = Arc::new(remote);
        let coordinator = RefreshCoordinator::new(
            SyncClass::Schools,
            cache.clone(),
            cooldown.clone(),
            remote.clone(),
        );

        Self {
            clock,
            cache_store,
            cooldown_store,
            cache,
            cooldown,
            remote,
            coordinator,
        }
    }
}

/// A schools coordinator over caller-supplied stores.
pub fn coordinator_over(
    cache_store: Arc<dyn KeyValueStore>,
    cooldown_store: Arc<dyn KeyValueStore>,
    remote: Arc<MockRemote<School>>,
) -> (Arc<ManualClock>, RefreshCoordinator<School>) {
    let clock = Arc::new(ManualClock::new(T0));
    let cache = LocalCacheStore::new(cache_store, clock.clone());
    let cooldown = CooldownTracker::new(cooldown_store, clock.clone());
    let coordinator = RefreshCoordinator::new(SyncClass::Schools, cache, cooldown, remote);
    (clock, coordinator)
}
