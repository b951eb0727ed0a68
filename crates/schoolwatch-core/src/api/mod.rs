//! Remote source of the directory.
//!
//! `RemoteSource` is the one operation the refresh coordinator needs: fetch
//! the complete current record set, or fail. `RealtimeDbClient` implements it
//! over the REST interface of a realtime JSON database.

pub mod client;
pub mod error;

use async_trait::async_trait;

pub use client::RealtimeDbClient;
pub use error::ApiError;

#[async_trait]
pub trait RemoteSource<R>: Send + Sync {
    /// Fetch every record of the collection, in remote order.
    async fn fetch_all(&self) -> Result<Vec<R>, ApiError>;
}

/// Stand-in used when no database URL is configured. Every fetch fails, so
/// refreshes fall back to whatever is cached.
pub struct UnconfiguredSource;

#[async_trait]
impl<R: Send + Sync> RemoteSource<R> for UnconfiguredSource {
    async fn fetch_all(&self) -> Result<Vec<R>, ApiError> {
        Err(ApiError::NotConfigured)
    }
}
