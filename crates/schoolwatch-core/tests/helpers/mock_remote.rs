use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use schoolwatch_core::{ApiError, RemoteSource};
use tokio::sync::{Notify, RwLock};

// ============================================================================
// Mock RemoteSource
// ============================================================================

pub struct MockRemote<R> {
    records: RwLock<Vec<R>>,
    call_count: AtomicU64,
    should_fail: AtomicBool,
    gate: Option<Notify>,
}

impl<R> MockRemote<R> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<R>) -> Self {
        Self {
            records: RwLock::new(records),
            call_count: AtomicU64::new(0),
            should_fail: AtomicBool::new(false),
            gate: None,
        }
    }

    pub fn failing() -> Self {
        let remote = Self::new();
        remote.set_should_fail(true);
        remote
    }

    /// Every fetch waits for `release` before answering.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Notify::new());
        self
    }

    pub fn release(&self) {
        if let Some(ref gate) = self.gate {
            gate.notify_one();
        }
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub async fn set_records(&self, records: Vec<R>) {
        *self.records.write().await = records;
    }
}

#[async_trait]
impl<R: Clone + Send + Sync> RemoteSource<R> for MockRemote<R> {
    async fn fetch_all(&self) -> Result<Vec<R>, ApiError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(ref gate) = self.gate {
            gate.notified().await;
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(ApiError::Unavailable("remote unreachable".to_string()));
        }
        Ok(self.records.read().await.clone())
    }
}
