//! Upstream module for fetching catalog data from the AnimeKompi JSON API
//!
//! This module provides an HTTP client with browser-like headers, retry with
//! exponential backoff, and a short-lived response cache.

pub mod feed;

pub use feed::{Feed, FeedSource};

use moka::future::Cache;
use rand::Rng;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

use crate::collector::SourceError;
use crate::constants::{endpoints, DEFAULT_UPSTREAM_BASE_URL};
use crate::models::{AnimeDetail, FeedPage, Schedule, UpstreamEnvelope, WatchData};

/// Errors that can occur while talking to the upstream API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// Network-related errors (connection timeout, DNS failure, etc.)
    #[error("Failed to connect to upstream: {0}")]
    Network(String),

    /// HTTP non-2xx status code errors
    #[error("Upstream returned status {0}")]
    Http(u16),

    /// Rate limited by upstream
    #[error("Rate limited, retry after delay")]
    RateLimited,

    /// Body could not be decoded or did not report success
    #[error("Failed to parse upstream response: {0}")]
    Parse(String),
}

impl From<UpstreamError> for SourceError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Parse(msg) => SourceError::Parse(msg),
            other => SourceError::Network(other.to_string()),
        }
    }
}

/// Configuration for the upstream client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the upstream API, without trailing slash
    pub base_url: String,
    /// Whether to rotate user agents
    pub rotate_user_agent: bool,
    /// Maximum attempts per request
    pub max_retries: u32,
    /// Base delay for exponential backoff in milliseconds
    pub backoff_base_ms: u64,
    /// How long a successful body stays cached; zero disables caching
    pub cache_ttl: Duration,
    /// Most bodies kept at once
    pub cache_capacity: u64,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            rotate_user_agent: true,
            max_retries: 3,
            backoff_base_ms: 500,
            cache_ttl: Duration::from_secs(60),
            cache_capacity: 1_000,
            timeout: Duration::from_secs(30),
        }
    }
}

/// List of realistic user agents for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36",
];

/// In-memory cache of raw response bodies keyed by URL
///
/// Entries live for the configured TTL; a zero TTL turns the cache off.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Option<Cache<String, String>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let inner = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build()
        });
        Self { inner }
    }

    /// Fresh body for `url`
    pub async fn get(&self, url: &str) -> Option<String> {
        self.inner.as_ref()?.get(url).await
    }

    pub async fn insert(&self, url: &str, body: String) {
        if let Some(cache) = &self.inner {
            cache.insert(url.to_string(), body).await;
        }
    }

    /// Number of live entries, after pending evictions have run
    pub async fn len(&self) -> u64 {
        match &self.inner {
            Some(cache) => {
                cache.run_pending_tasks().await;
                cache.entry_count()
            }
            None => 0,
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("enabled", &self.inner.is_some())
            .field(
                "entries",
                &self.inner.as_ref().map_or(0, |c| c.entry_count()),
            )
            .finish()
    }
}

/// Decode an upstream envelope, rejecting anything that is not a success
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, UpstreamError> {
    let envelope: UpstreamEnvelope<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| UpstreamError::Parse(e.to_string()))?;

    if !envelope.status.is_empty() && envelope.status != "success" {
        return Err(UpstreamError::Parse(format!(
            "upstream reported status '{}'",
            envelope.status
        )));
    }
    if envelope.data.is_null() {
        return Err(UpstreamError::Parse("upstream returned no data".to_string()));
    }

    serde_json::from_value(envelope.data).map_err(|e| UpstreamError::Parse(e.to_string()))
}

/// HTTP client for the upstream catalog API
pub struct UpstreamClient {
    client: Client,
    config: ClientConfig,
    cache: ResponseCache,
    request_count: AtomicUsize,
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("base_url", &self.config.base_url)
            .field("cache", &self.cache)
            .finish()
    }
}

impl UpstreamClient {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        Ok(Self {
            client,
            cache: ResponseCache::new(config.cache_ttl, config.cache_capacity),
            config,
            request_count: AtomicUsize::new(0),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Number of requests that actually went out over the network
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Latest releases, one page
    pub async fn home(&self, page: u32) -> Result<FeedPage, UpstreamError> {
        self.get_json(&endpoints::home(&self.config.base_url, page)).await
    }

    /// Batch releases, one page
    pub async fn batch(&self, page: u32) -> Result<FeedPage, UpstreamError> {
        self.get_json(&endpoints::batch(&self.config.base_url, page)).await
    }

    /// Search results for `query`, one page
    pub async fn search(&self, query: &str, page: u32) -> Result<FeedPage, UpstreamError> {
        self.get_json(&endpoints::search(&self.config.base_url, query, page))
            .await
    }

    pub async fn detail(&self, slug: &str) -> Result<AnimeDetail, UpstreamError> {
        self.get_json(&endpoints::detail(&self.config.base_url, slug))
            .await
    }

    pub async fn watch(&self, slug: &str) -> Result<WatchData, UpstreamError> {
        self.get_json(&endpoints::watch(&self.config.base_url, slug))
            .await
    }

    pub async fn schedule(&self) -> Result<Schedule, UpstreamError> {
        self.get_json(&endpoints::schedule(&self.config.base_url))
            .await
    }

    /// Fetch `url` and decode its envelope, going through the cache
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        if let Some(body) = self.cache.get(url).await {
            tracing::debug!("Cache hit for {}", url);
            return decode_envelope(&body);
        }

        let body = self.fetch_text(url).await?;
        let data = decode_envelope(&body)?;
        self.cache.insert(url, body).await;
        Ok(data)
    }

    /// Fetch a body, retrying rate limits and server errors with backoff
    async fn fetch_text(&self, url: &str) -> Result<String, UpstreamError> {
        let mut last_error = None;

        for attempt in 0..self.config.max_retries.max(1) {
            if attempt > 0 {
                self.apply_backoff(attempt).await;
            }

            match self.do_fetch(url).await {
                Ok(body) => return Ok(body),
                Err(UpstreamError::RateLimited) => {
                    tracing::warn!("Rate limited on attempt {}, backing off...", attempt + 1);
                    last_error = Some(UpstreamError::RateLimited);
                }
                Err(UpstreamError::Http(status)) if status >= 500 => {
                    tracing::warn!("HTTP {} on attempt {}, retrying...", status, attempt + 1);
                    last_error = Some(UpstreamError::Http(status));
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| UpstreamError::Network("Max retries exceeded".to_string())))
    }

    async fn do_fetch(&self, url: &str) -> Result<String, UpstreamError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);

        let response = self
            .client
            .get(url)
            .header("User-Agent", self.get_user_agent())
            .header("Accept", "application/json")
            .header("Accept-Language", "id-ID,id;q=0.9,en;q=0.8")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Network("Connection timeout".to_string())
                } else if e.is_connect() {
                    UpstreamError::Network("Failed to connect to upstream".to_string())
                } else {
                    UpstreamError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(UpstreamError::RateLimited);
        }
        if !status.is_success() {
            return Err(UpstreamError::Http(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))
    }

    fn get_user_agent(&self) -> &'static str {
        if self.config.rotate_user_agent {
            let idx = rand::thread_rng().gen_range(0..USER_AGENTS.len());
            USER_AGENTS[idx]
        } else {
            USER_AGENTS[0]
        }
    }

    async fn apply_backoff(&self, attempt: u32) {
        let delay = self.config.backoff_base_ms * 2u64.pow(attempt);
        let jitter = rand::thread_rng().gen_range(0..250);
        sleep(Duration::from_millis(delay + jitter)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client() -> UpstreamClient {
        UpstreamClient::new(ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            max_retries: 1,
            backoff_base_ms: 1,
            timeout: Duration::from_millis(500),
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_UPSTREAM_BASE_URL);
        assert!(config.rotate_user_agent);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_user_agent_rotation() {
        let client = offline_client();
        assert!(USER_AGENTS.contains(&client.get_user_agent()));
    }

    #[test]
    fn test_decode_feed_envelope() {
        let body = r#"{"status": "success", "data": {"page": 1, "total_pages": 3, "anime": [
            {"slug": "a", "title": "A", "type": "TV", "latest_episode": "1"}
        ]}}"#;

        let page: FeedPage = decode_envelope(body).unwrap();
        assert_eq!(page.total_pages, Some(3));
        assert_eq!(page.anime[0].slug, "a");
    }

    #[test]
    fn test_decode_rejects_error_status() {
        let body = r#"{"status": "error", "data": null}"#;
        let result: Result<FeedPage, _> = decode_envelope(body);
        assert!(matches!(result, Err(UpstreamError::Parse(_))));
    }

    #[test]
    fn test_decode_rejects_null_data() {
        let body = r#"{"status": "success", "data": null}"#;
        let result: Result<AnimeDetail, _> = decode_envelope(body);
        assert!(matches!(result, Err(UpstreamError::Parse(_))));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result: Result<FeedPage, _> = decode_envelope("<html>oops</html>");
        assert!(matches!(result, Err(UpstreamError::Parse(_))));
    }

    #[test]
    fn test_decode_schedule() {
        let body = r#"{"status": "success", "data": {
            "Senin": [{"slug": "a", "title": "A"}],
            "Selasa": []
        }}"#;

        let schedule: Schedule = decode_envelope(body).unwrap();
        assert_eq!(schedule["Senin"].len(), 1);
        assert!(schedule["Selasa"].is_empty());
    }

    #[test]
    fn test_upstream_error_into_source_error() {
        assert_eq!(
            SourceError::from(UpstreamError::Parse("bad".to_string())),
            SourceError::Parse("bad".to_string())
        );
        assert!(matches!(
            SourceError::from(UpstreamError::Http(503)),
            SourceError::Network(_)
        ));
        assert!(matches!(
            SourceError::from(UpstreamError::RateLimited),
            SourceError::Network(_)
        ));
    }

    #[tokio::test]
    async fn test_cache_hit_within_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(60), 100);
        cache.insert("u", "body".to_string()).await;
        assert_eq!(cache.get("u").await.as_deref(), Some("body"));
        assert_eq!(cache.get("other").await, None);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_cache_expires_entries() {
        let cache = ResponseCache::new(Duration::from_millis(10), 100);
        cache.insert("u", "body".to_string()).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.get("u").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let cache = ResponseCache::new(Duration::ZERO, 100);
        cache.insert("u", "body".to_string()).await;
        assert_eq!(cache.get("u").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_is_bounded_by_capacity() {
        let cache = ResponseCache::new(Duration::from_secs(60), 100);
        for i in 0..5_000 {
            let url = endpoints::search(DEFAULT_UPSTREAM_BASE_URL, &i.to_string(), 1);
            cache.insert(&url, "body".to_string()).await;
        }
        assert!(cache.len().await <= 100);
    }

    #[tokio::test]
    async fn test_cached_body_skips_network() {
        let client = offline_client();
        let url = endpoints::home(client.base_url(), 1);
        client.cache().insert(
            &url,
            r#"{"status": "success", "data": {"page": 1, "anime": []}}"#.to_string(),
        )
        .await;

        let page = client.home(1).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_network_error() {
        let client = offline_client();
        let result = client.batch(1).await;
        assert!(matches!(result, Err(UpstreamError::Network(_))));
        assert_eq!(client.request_count(), 1);
    }
}
