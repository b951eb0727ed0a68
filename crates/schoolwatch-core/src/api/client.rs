//! HTTP client for the realtime database REST interface.
//!
//! Collections are read with `GET {database_url}/{collection}.json`. The
//! database answers with `null` for an empty collection, with an object keyed
//! by child id, or with an array when the children were written with
//! sequential integer keys.

use std::cmp::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use tracing::{debug, warn};

use super::{ApiError, RemoteSource};
use crate::models::Record;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Client for one database, shared by every collection it serves.
pub struct RealtimeDbClient {
    client: Client,
    database_url: String,
    token: Option<String>,
}

impl RealtimeDbClient {
    pub fn new(database_url: impl Into<String>) -> Result<Self, ApiError> {
        let database_url = database_url.into().trim().trim_end_matches('/').to_string();
        if database_url.is_empty() {
            return Err(ApiError::NotConfigured);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            database_url,
            token: None,
        })
    }

    /// Set the database auth token sent with every request
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}.json", self.database_url, collection)
    }

    /// Check if response is successful.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get(&self, url: &str) -> Result<Value, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request = self
                .client
                .get(url)
                .header(header::ACCEPT, "application/json");
            if let Some(ref token) = self.token {
                request = request.query(&[("auth", token)]);
            }
            let response = request.send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let text = response.text().await?;
                    return serde_json::from_str(&text).map_err(|e| {
                        ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", url, e))
                    });
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    /// Fetch every child of the record type's collection
    pub async fn fetch_collection<R: Record>(&self) -> Result<Vec<R>, ApiError> {
        let url = self.collection_url(R::COLLECTION);
        let body = self.get(&url).await?;
        let records = parse_collection::<R>(body)?;
        debug!(collection = R::COLLECTION, count = records.len(), "Fetched collection");
        Ok(records)
    }
}

#[async_trait]
impl<R: Record> RemoteSource<R> for RealtimeDbClient {
    async fn fetch_all(&self) -> Result<Vec<R>, ApiError> {
        self.fetch_collection::<R>().await
    }
}

/// Child key order used by the database: integer keys first in numeric
/// order, then every other key lexicographically.
fn compare_child_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn parse_collection<R: Record>(body: Value) -> Result<Vec<R>, ApiError> {
    let mut children: Vec<(String, Value)> = match body {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        other => {
            return Err(ApiError::InvalidResponse(format!(
                "Expected a collection for '{}', got {}",
                R::COLLECTION,
                other
            )))
        }
    };
    children.sort_by(|(a, _), (b, _)| compare_child_keys(a, b));

    let mut records = Vec::with_capacity(children.len());
    for (key, value) in children {
        if value.is_null() {
            continue;
        }
        match serde_json::from_value::<R>(value) {
            Ok(mut record) => {
                record.adopt_remote_key(&key);
                records.push(record);
            }
            Err(e) => {
                warn!(collection = R::COLLECTION, key = %key, error = %e, "Skipping unparseable record");
            }
        }
    }
    Ok(records)
}
