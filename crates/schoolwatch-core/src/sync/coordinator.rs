use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::RefreshOutcome;
use crate::api::RemoteSource;
use crate::cache::{CacheInfo, CooldownTracker, LocalCacheStore, SyncClass};
use crate::models::Record;

/// Whether a failed remote fetch starts a new cooldown window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedFetchPolicy {
    /// Only a successful fetch is recorded, so a retry is possible as soon
    /// as the remote recovers.
    #[default]
    KeepWindowOpen,
    /// Every started fetch is recorded, so a remote that is down is not
    /// hammered.
    ConsumeWindow,
}

impl FailedFetchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailedFetchPolicy::KeepWindowOpen => "keep_window_open",
            FailedFetchPolicy::ConsumeWindow => "consume_window",
        }
    }
}

impl fmt::Display for FailedFetchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailedFetchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "keep_window_open" => Ok(FailedFetchPolicy::KeepWindowOpen),
            "consume_window" => Ok(FailedFetchPolicy::ConsumeWindow),
            other => Err(format!(
                "unknown failed fetch policy '{}' (expected keep_window_open or consume_window)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RefreshMode {
    Smart,
    Force,
}

struct Inner<R> {
    class: SyncClass,
    cache: LocalCacheStore<R>,
    cooldown: CooldownTracker,
    remote: Arc<dyn RemoteSource<R>>,
}

/// Entry point for refreshing one sync class.
///
/// At most one refresh runs at a time per coordinator (clones share the
/// gate); overlapping calls wait for the running one and then see its
/// effects. The refresh itself runs on a spawned task that owns the gate,
/// so dropping the returned future never cuts a fetch off between the
/// cache write and the cooldown write. Must be called from within a tokio
/// runtime.
pub struct RefreshCoordinator<R> {
    inner: Arc<Inner<R>>,
    in_flight: Arc<Mutex<()>>,
    policy: FailedFetchPolicy,
}

impl<R> Clone for RefreshCoordinator<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            in_flight: Arc::clone(&self.in_flight),
            policy: self.policy,
        }
    }
}

impl<R: Record> RefreshCoordinator<R> {
    pub fn new(
        class: SyncClass,
        cache: LocalCacheStore<R>,
        cooldown: CooldownTracker,
        remote: Arc<dyn RemoteSource<R>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                class,
                cache,
                cooldown,
                remote,
            }),
            in_flight: Arc::new(Mutex::new(())),
            policy: FailedFetchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailedFetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn class(&self) -> SyncClass {
        self.inner.class
    }

    pub fn policy(&self) -> FailedFetchPolicy {
        self.policy
    }

    /// Serve a fresh cache if there is one, otherwise behave like `force_refresh`.
    pub async fn smart_refresh(&self) -> RefreshOutcome<R> {
        self.run(RefreshMode::Smart).await
    }

    /// Fetch from the remote regardless of cache freshness. Still refused
    /// while the cooldown window is active.
    pub async fn force_refresh(&self) -> RefreshOutcome<R> {
        self.run(RefreshMode::Force).await
    }

    async fn run(&self, mode: RefreshMode) -> RefreshOutcome<R> {
        let gate = Arc::clone(&self.in_flight).lock_owned().await;
        let inner = Arc::clone(&self.inner);
        let policy = self.policy;

        let task = tokio::spawn(async move {
            let _gate = gate;
            match mode {
                RefreshMode::Smart => inner.smart_refresh(policy).await,
                RefreshMode::Force => inner.force_refresh(policy).await,
            }
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(class = %self.inner.class, error = %e, "Refresh task failed");
                RefreshOutcome::Error {
                    message: format!("refresh of {} failed unexpectedly", self.inner.class),
                }
            }
        }
    }

    pub fn is_sync_allowed(&self) -> bool {
        self.inner.cooldown.can_sync(self.inner.class)
    }

    pub fn remaining_cooldown_minutes(&self) -> i64 {
        self.inner.cooldown.minutes_remaining(self.inner.class)
    }

    pub fn cache_info(&self) -> CacheInfo {
        self.inner.cache.info()
    }

    /// Whatever the cache holds, fresh or not
    pub fn cached_records(&self) -> Vec<R> {
        self.inner.cache.load()
    }
}

impl<R: Record> Inner<R> {
    async fn smart_refresh(&self, policy: FailedFetchPolicy) -> RefreshOutcome<R> {
        if !self.cache.is_expired() {
            let records = self.cache.load();
            if !records.is_empty() {
                debug!(class = %self.class, count = records.len(), "Serving fresh cache");
                return RefreshOutcome::Success {
                    records,
                    served_from_cache: true,
                };
            }
        }

        // Expired or empty. An active cooldown wins over staleness; that
        // check is the first step of a forced refresh.
        self.force_refresh(policy).await
    }

    async fn force_refresh(&self, policy: FailedFetchPolicy) -> RefreshOutcome<R> {
        if !self.cooldown.can_sync(self.class) {
            let minutes_remaining = self.cooldown.minutes_remaining(self.class);
            debug!(class = %self.class, minutes_remaining, "Sync refused, cooldown active");
            return RefreshOutcome::Cooldown { minutes_remaining };
        }

        info!(class = %self.class, "Fetching from remote");
        match self.remote.fetch_all().await {
            Ok(records) => {
                info!(class = %self.class, count = records.len(), "Remote fetch succeeded");
                self.cache.save(&records);
                self.cooldown.record_attempt(self.class);
                RefreshOutcome::Success {
                    records,
                    served_from_cache: false,
                }
            }
            Err(e) => {
                warn!(class = %self.class, error = %e, "Remote fetch failed");
                if policy == FailedFetchPolicy::ConsumeWindow {
                    self.cooldown.record_attempt(self.class);
                }

                let records = self.cache.load();
                if records.is_empty() {
                    return RefreshOutcome::Error {
                        message: e.to_string(),
                    };
                }
                info!(class = %self.class, count = records.len(), "Falling back to cached records");
                RefreshOutcome::Success {
                    records,
                    served_from_cache: true,
                }
            }
        }
    }
}
