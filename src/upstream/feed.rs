//! Paginated upstream feeds as collector sources

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use super::{UpstreamClient, UpstreamError};
use crate::collector::{PageResult, PageSource, SourceError};
use crate::models::{AnimeItem, FeedPage};

/// One of the paginated listings the upstream exposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    Home,
    Batch,
    Search(String),
}

impl Feed {
    /// Parse a feed name from a route segment; search needs a non-blank query
    pub fn from_name(name: &str, query: Option<&str>) -> Option<Self> {
        match name {
            "home" => Some(Feed::Home),
            "batch" => Some(Feed::Batch),
            "search" => query
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(|q| Feed::Search(q.to_string())),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Feed::Home => "home",
            Feed::Batch => "batch",
            Feed::Search(_) => "search",
        }
    }

    /// Fetch one page of this feed
    pub async fn fetch(&self, client: &UpstreamClient, page: u32) -> Result<FeedPage, UpstreamError> {
        match self {
            Feed::Home => client.home(page).await,
            Feed::Batch => client.batch(page).await,
            Feed::Search(query) => client.search(query, page).await,
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feed::Search(query) => write!(f, "search({})", query),
            other => f.write_str(other.name()),
        }
    }
}

/// A feed bound to a shared client
#[derive(Debug, Clone)]
pub struct FeedSource {
    client: Arc<UpstreamClient>,
    feed: Feed,
}

impl FeedSource {
    pub fn new(client: Arc<UpstreamClient>, feed: Feed) -> Self {
        Self { client, feed }
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }
}

#[async_trait]
impl PageSource<AnimeItem> for FeedSource {
    async fn fetch_page(&self, page: u32) -> Result<PageResult<AnimeItem>, SourceError> {
        tracing::debug!("Fetching {} page {}", self.feed, page);
        let page = self.feed.fetch(&self.client, page).await?;
        Ok(page.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{LoadOutcome, PaginatedCollector};
    use crate::constants::endpoints;
    use crate::upstream::ClientConfig;
    use std::time::Duration;

    async fn cached_client(pages: &[(u32, &str)]) -> Arc<UpstreamClient> {
        let client = UpstreamClient::new(ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            max_retries: 1,
            timeout: Duration::from_millis(500),
            ..ClientConfig::default()
        })
        .unwrap();
        for (page, body) in pages {
            client
                .cache()
                .insert(&endpoints::home(client.base_url(), *page), body.to_string())
                .await;
        }
        Arc::new(client)
    }

    #[test]
    fn test_feed_from_name() {
        assert_eq!(Feed::from_name("home", None), Some(Feed::Home));
        assert_eq!(Feed::from_name("batch", Some("x")), Some(Feed::Batch));
        assert_eq!(
            Feed::from_name("search", Some(" naruto ")),
            Some(Feed::Search("naruto".to_string()))
        );
        assert_eq!(Feed::from_name("search", Some("  ")), None);
        assert_eq!(Feed::from_name("search", None), None);
        assert_eq!(Feed::from_name("movies", None), None);
    }

    #[test]
    fn test_feed_display() {
        assert_eq!(Feed::Home.to_string(), "home");
        assert_eq!(Feed::Search("op".to_string()).to_string(), "search(op)");
    }

    #[tokio::test]
    async fn test_feed_source_drives_collector() {
        let client = cached_client(&[(
            2,
            r#"{"status": "success", "data": {"page": 2, "total_pages": 2, "anime": [
                {"slug": "b", "title": "B"}, {"slug": "c", "title": "C"}
            ]}}"#,
        )])
        .await;
        let seed: Vec<AnimeItem> =
            serde_json::from_str(r#"[{"slug": "a", "title": "A"}, {"slug": "b", "title": "B"}]"#)
                .unwrap();

        let collector = PaginatedCollector::new(FeedSource::new(client, Feed::Home), seed, 1);
        let outcome = collector.notify_visible().await;

        assert_eq!(outcome, LoadOutcome::Exhausted { added: 1 });
        let slugs: Vec<String> = collector.items().into_iter().map(|i| i.slug).collect();
        assert_eq!(slugs, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_feed_source_maps_upstream_failure() {
        let client = cached_client(&[]).await;
        let source = FeedSource::new(client, Feed::Batch);
        let result = source.fetch_page(1).await;
        assert!(matches!(result, Err(SourceError::Network(_))));
    }
}
