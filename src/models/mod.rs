//! Data models for the AnimeKompi API
//!
//! This module contains the upstream catalog records, the response envelopes
//! used by every endpoint, and the admin/SEO request and record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::collector::{Identified, PageResult};
use crate::slug::SlugKind;

// ============================================================================
// Upstream catalog records
// ============================================================================

/// Envelope wrapping every upstream response
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamEnvelope<T> {
    /// "success" on healthy responses
    #[serde(default)]
    pub status: String,
    pub data: T,
}

/// A card-level catalog entry from the home, batch, search or schedule feeds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnimeItem {
    /// Series or episode slug
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// TV, Movie, OVA, ...
    #[serde(rename = "type", default)]
    pub anime_type: String,
    #[serde(alias = "latest_episode", default)]
    pub latest_episode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<String>,
    #[serde(alias = "release_time", default, skip_serializing_if = "Option::is_none")]
    pub release_time: Option<String>,
}

impl AnimeItem {
    /// Image to display for the card; `thumbnail` wins over `image`
    pub fn cover(&self) -> &str {
        self.thumbnail
            .as_deref()
            .or(self.image.as_deref())
            .unwrap_or("")
    }
}

impl Identified for AnimeItem {
    fn identifier(&self) -> &str {
        &self.slug
    }
}

/// One page of a paginated upstream feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub page: u32,
    #[serde(alias = "total_pages", default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub anime: Vec<AnimeItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl From<FeedPage> for PageResult<AnimeItem> {
    fn from(page: FeedPage) -> Self {
        PageResult {
            items: page.anime,
            page: page.page,
            total_pages: page.total_pages,
        }
    }
}

/// Series information block of the detail endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnimeInfo {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub studio: String,
    /// Release date
    #[serde(default)]
    pub dirilis: String,
    /// Episode duration
    #[serde(default)]
    pub durasi: String,
    #[serde(default)]
    pub season: String,
    /// Series type
    #[serde(default)]
    pub tipe: String,
    #[serde(default)]
    pub censor: String,
    #[serde(alias = "diposting_oleh", default)]
    pub diposting_oleh: String,
    #[serde(alias = "diperbarui_pada", default)]
    pub diperbarui_pada: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Episode entry inside a series detail, newest first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRef {
    pub slug: String,
    /// Episode label, usually the number
    #[serde(default)]
    pub episode: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
}

/// Full series detail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnimeDetail {
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub synopsis: String,
    #[serde(default)]
    pub info: AnimeInfo,
    #[serde(default)]
    pub episodes: Vec<EpisodeRef>,
}

/// Embeddable stream for an episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StreamingServer {
    pub name: String,
    #[serde(rename = "type", default)]
    pub server_type: String,
    pub url: String,
}

/// Download mirror for a given quality
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProvider {
    pub provider: String,
    pub url: String,
}

/// Download links grouped by quality
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub quality: String,
    #[serde(default)]
    pub links: Vec<DownloadProvider>,
}

/// Stream and download links for one episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchData {
    pub title: String,
    #[serde(alias = "streaming_servers", default)]
    pub streaming_servers: Vec<StreamingServer>,
    #[serde(alias = "download_links", default)]
    pub download_links: Vec<DownloadLink>,
}

/// Weekly release schedule keyed by Indonesian day name
pub type Schedule = BTreeMap<String, Vec<AnimeItem>>;

// ============================================================================
// Catalog view models
// ============================================================================

/// Where a slug should be routed and what it resolves to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlugRoute {
    pub slug: String,
    pub kind: SlugKind,
    /// Site path for the slug, `/watch/..` or `/anime/..`
    pub href: String,
    pub series_slug: String,
    pub episode_number: Option<String>,
}

/// A listing item ready to render as a card
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnimeCard {
    #[serde(flatten)]
    pub item: AnimeItem,
    pub cover: String,
    pub href: String,
    pub is_episode: bool,
}

/// A page of cards from one feed
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedView {
    pub page: u32,
    pub total_pages: Option<u32>,
    pub items: Vec<AnimeCard>,
    /// Hero slides, only on the first home page
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hero: Vec<AnimeCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Watch page data with previous/next navigation
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchView {
    pub slug: String,
    pub title: String,
    pub series_slug: String,
    pub episode_number: Option<String>,
    pub streaming_servers: Vec<StreamingServer>,
    pub download_links: Vec<DownloadLink>,
    pub previous_episode: Option<String>,
    pub next_episode: Option<String>,
}

/// One day of the weekly schedule
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDay {
    pub day: String,
    pub is_today: bool,
    pub items: Vec<AnimeCard>,
}

/// Result of driving a collector over a feed
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectedFeed {
    pub feed: String,
    pub items: Vec<AnimeItem>,
    pub last_page: u32,
    pub exhausted: bool,
    pub last_error: Option<String>,
}

// ============================================================================
// Response envelopes
// ============================================================================

/// Generic API response wrapper for successful responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the operation was successful (always true for this type)
    pub success: bool,
    /// The response payload
    pub data: T,
    /// ISO timestamp of when data was fetched
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// Create a new successful API response with the current timestamp
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Create a new successful API response with a custom timestamp
    pub fn with_timestamp(data: T, timestamp: DateTime<Utc>) -> Self {
        Self {
            success: true,
            data,
            timestamp: timestamp.to_rfc3339(),
        }
    }
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Whether the operation was successful (always false for errors)
    pub success: bool,
    /// Error message describing what went wrong
    pub error: String,
    /// ISO timestamp of when the error occurred
    pub timestamp: String,
}

impl ApiError {
    /// Create a new API error response with the current timestamp
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

// ============================================================================
// Admin and SEO settings
// ============================================================================

/// Site-wide SEO settings, a single stored row
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeoSettings {
    pub id: i32,
    pub site_name: String,
    pub site_description: String,
    pub google_verification: String,
    pub bing_verification: String,
    pub yandex_verification: String,
    pub google_analytics_id: String,
    pub facebook_pixel_id: String,
    pub meta_description: String,
    /// Comma separated
    pub meta_keywords: String,
    pub og_image: String,
    pub twitter_handle: String,
    pub updated_at: String,
}

/// Partial update of the SEO settings; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeoSettingsUpdate {
    pub site_name: Option<String>,
    pub site_description: Option<String>,
    pub google_verification: Option<String>,
    pub bing_verification: Option<String>,
    pub yandex_verification: Option<String>,
    pub google_analytics_id: Option<String>,
    pub facebook_pixel_id: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub og_image: Option<String>,
    pub twitter_handle: Option<String>,
}

/// An admin account as exposed by the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: i32,
    pub username: String,
    pub created_at: String,
}

/// Request body for admin login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for changing the admin password
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Issued on successful admin login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminSessionData {
    pub username: String,
    /// Signed session token, also set as an HTTP-only cookie
    pub token: String,
}

/// Result of the admin bootstrap endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminInitData {
    pub created: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anime_item_deserialization() {
        let json = r#"{
            "slug": "one-piece-episode-1120-subtitle-indonesia",
            "title": "One Piece Episode 1120",
            "thumbnail": "https://example.com/op.jpg",
            "type": "TV",
            "latest_episode": "1120",
            "release_time": "2 jam lalu"
        }"#;

        let item: AnimeItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.slug, "one-piece-episode-1120-subtitle-indonesia");
        assert_eq!(item.anime_type, "TV");
        assert_eq!(item.latest_episode, "1120");
        assert_eq!(item.release_time.as_deref(), Some("2 jam lalu"));
        assert_eq!(item.image, None);
        assert_eq!(item.identifier(), item.slug);
    }

    #[test]
    fn test_anime_item_cover_prefers_thumbnail() {
        let mut item: AnimeItem =
            serde_json::from_str(r#"{"slug": "a", "title": "A", "image": "i.jpg"}"#).unwrap();
        assert_eq!(item.cover(), "i.jpg");

        item.thumbnail = Some("t.jpg".to_string());
        assert_eq!(item.cover(), "t.jpg");

        item.thumbnail = None;
        item.image = None;
        assert_eq!(item.cover(), "");
    }

    #[test]
    fn test_anime_item_serialization_is_camel_case() {
        let item = AnimeItem {
            slug: "naruto".to_string(),
            title: "Naruto".to_string(),
            thumbnail: None,
            image: None,
            anime_type: "TV".to_string(),
            latest_episode: "220".to_string(),
            episode: None,
            release_time: None,
        };

        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"latestEpisode\":\"220\""));
        assert!(json.contains("\"type\":\"TV\""));
        assert!(!json.contains("thumbnail"));
    }

    #[test]
    fn test_feed_envelope_into_page_result() {
        let json = r#"{
            "status": "success",
            "data": {
                "page": 2,
                "total_pages": 40,
                "anime": [
                    {"slug": "a", "title": "A", "type": "TV", "latest_episode": "1"},
                    {"slug": "b", "title": "B", "type": "TV", "latest_episode": "2"}
                ]
            }
        }"#;

        let envelope: UpstreamEnvelope<FeedPage> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.status, "success");

        let page: PageResult<AnimeItem> = envelope.data.into();
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, Some(40));
        assert_eq!(page.items.len(), 2);
    }

    #[test]
    fn test_feed_page_without_total_pages() {
        let page: FeedPage = serde_json::from_str(r#"{"page": 1, "anime": []}"#).unwrap();
        assert_eq!(page.total_pages, None);
        assert!(page.anime.is_empty());
    }

    #[test]
    fn test_anime_detail_deserialization() {
        let json = r#"{
            "title": "One Piece",
            "thumbnail": "https://example.com/op.jpg",
            "synopsis": "Pirates.",
            "info": {
                "status": "Ongoing",
                "studio": "Toei",
                "genres": ["Action", "Adventure"]
            },
            "episodes": [
                {"slug": "one-piece-episode-2", "episode": "2", "title": "Two", "date": "2024-01-08"},
                {"slug": "one-piece-episode-1", "episode": "1", "title": "One", "date": "2024-01-01"}
            ]
        }"#;

        let detail: AnimeDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.info.studio, "Toei");
        assert_eq!(detail.info.season, "");
        assert_eq!(detail.info.genres, vec!["Action", "Adventure"]);
        assert_eq!(detail.episodes[0].slug, "one-piece-episode-2");
    }

    #[test]
    fn test_watch_data_deserialization() {
        let json = r#"{
            "title": "One Piece Episode 1120",
            "streaming_servers": [{"name": "Server 1", "type": "iframe", "url": "https://s/1"}],
            "download_links": [
                {"quality": "720p", "links": [{"provider": "GDrive", "url": "https://d/1"}]}
            ]
        }"#;

        let watch: WatchData = serde_json::from_str(json).unwrap();
        assert_eq!(watch.streaming_servers[0].server_type, "iframe");
        assert_eq!(watch.download_links[0].links[0].provider, "GDrive");
    }

    #[test]
    fn test_seo_settings_update_deserializes_partial_body() {
        let update: SeoSettingsUpdate =
            serde_json::from_str(r#"{"metaDescription": "Nonton anime"}"#).unwrap();
        assert_eq!(update.meta_description.as_deref(), Some("Nonton anime"));
        assert_eq!(update.site_name, None);
    }

    #[test]
    fn test_change_password_request_deserialization() {
        let request: ChangePasswordRequest =
            serde_json::from_str(r#"{"currentPassword": "old", "newPassword": "newer1"}"#)
                .unwrap();
        assert_eq!(request.current_password, "old");
        assert_eq!(request.new_password, "newer1");
    }

    #[test]
    fn test_api_response_serialization() {
        let response = ApiResponse::new(vec!["item1", "item2"]);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"data\""));
        assert!(json.contains("\"timestamp\""));
    }

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("Something went wrong");

        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"error\":\"Something went wrong\""));
    }

    #[test]
    fn test_anime_card_flattens_item() {
        let card = AnimeCard {
            item: serde_json::from_str(r#"{"slug": "naruto-ep-5", "title": "Naruto 5"}"#)
                .unwrap(),
            cover: String::new(),
            href: "/watch/naruto-ep-5".to_string(),
            is_episode: true,
        };

        let json = serde_json::to_string(&card).unwrap();
        assert!(json.contains("\"slug\":\"naruto-ep-5\""));
        assert!(json.contains("\"href\":\"/watch/naruto-ep-5\""));
        assert!(json.contains("\"isEpisode\":true"));
    }
}
