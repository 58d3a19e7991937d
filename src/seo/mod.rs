//! Search-engine metadata for the public site
//!
//! Builds page metadata from the stored SEO settings, per-series metadata
//! with JSON-LD structured data, and the sitemap.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::constants::site::{
    DEFAULT_DESCRIPTION, DEFAULT_KEYWORDS, DEFAULT_OG_IMAGE, DEFAULT_SHORT_DESCRIPTION,
    DEFAULT_SITE_NAME, DEFAULT_TITLE, DEFAULT_TWITTER_HANDLE, SITEMAP_ROUTES, TITLE_TEMPLATE,
};
use crate::models::{AnimeDetail, SeoSettings};

/// Site-wide page metadata
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteMetadata {
    pub site_url: String,
    pub site_name: String,
    pub title: String,
    /// `%s` is replaced with the page title
    pub title_template: String,
    pub description: String,
    /// Shorter description used for social cards
    pub social_description: String,
    pub keywords: Vec<String>,
    pub og_image: String,
    pub twitter_creator: String,
    pub google_verification: Option<String>,
    pub bing_verification: Option<String>,
    pub yandex_verification: Option<String>,
    pub google_analytics_id: Option<String>,
    pub facebook_pixel_id: Option<String>,
}

/// Metadata for a single series page
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnimeMetadata {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub og_title: String,
    pub image: String,
    /// schema.org TVSeries object
    #[schema(value_type = Object)]
    pub json_ld: serde_json::Value,
}

/// One `<url>` of the sitemap
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SitemapEntry {
    pub url: String,
    pub last_modified: DateTime<Utc>,
    pub change_frequency: String,
    pub priority: f32,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn setting<F>(settings: Option<&SeoSettings>, get: F) -> Option<String>
where
    F: Fn(&SeoSettings) -> &String,
{
    settings.and_then(|s| non_empty(get(s)))
}

/// Split a comma separated keyword list, dropping blanks
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build site metadata; missing settings or blank fields fall back to defaults
pub fn site_metadata(settings: Option<&SeoSettings>, site_url: &str) -> SiteMetadata {
    let meta_description = setting(settings, |s| &s.meta_description);
    let keywords = settings
        .map(|s| split_keywords(&s.meta_keywords))
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect());

    SiteMetadata {
        site_url: site_url.trim_end_matches('/').to_string(),
        site_name: setting(settings, |s| &s.site_name).unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
        title: DEFAULT_TITLE.to_string(),
        title_template: TITLE_TEMPLATE.to_string(),
        description: meta_description
            .clone()
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        social_description: meta_description
            .unwrap_or_else(|| DEFAULT_SHORT_DESCRIPTION.to_string()),
        keywords,
        og_image: setting(settings, |s| &s.og_image).unwrap_or_else(|| DEFAULT_OG_IMAGE.to_string()),
        twitter_creator: setting(settings, |s| &s.twitter_handle)
            .unwrap_or_else(|| DEFAULT_TWITTER_HANDLE.to_string()),
        google_verification: setting(settings, |s| &s.google_verification),
        bing_verification: setting(settings, |s| &s.bing_verification),
        yandex_verification: setting(settings, |s| &s.yandex_verification),
        google_analytics_id: setting(settings, |s| &s.google_analytics_id),
        facebook_pixel_id: setting(settings, |s| &s.facebook_pixel_id),
    }
}

/// schema.org structured data for a series
pub fn json_ld(detail: &AnimeDetail) -> serde_json::Value {
    json!({
        "@context": "https://schema.org",
        "@type": "TVSeries",
        "name": detail.title,
        "description": detail.synopsis,
        "image": detail.thumbnail,
        "genre": detail.info.genres,
        "numberOfEpisodes": detail.episodes.len(),
        "productionCompany": {
            "@type": "Organization",
            "name": detail.info.studio,
        },
    })
}

/// Metadata for a series detail page
pub fn anime_metadata(detail: &AnimeDetail) -> AnimeMetadata {
    let title = &detail.title;
    let description = non_empty(&detail.synopsis).unwrap_or_else(|| {
        format!(
            "Nonton {} subtitle Indonesia terbaru. {}. Status: {}.",
            title,
            detail.info.genres.join(", "),
            detail.info.status
        )
    });

    let mut keywords = vec![
        title.clone(),
        format!("nonton {}", title),
        format!("{} sub indo", title),
    ];
    keywords.extend(detail.info.genres.iter().cloned());
    keywords.push("anime subtitle indonesia".to_string());

    AnimeMetadata {
        title: format!("{} - Nonton Anime Sub Indo", title),
        description,
        keywords,
        og_title: format!("{} - {}", title, DEFAULT_SITE_NAME),
        image: detail.thumbnail.clone(),
        json_ld: json_ld(detail),
    }
}

pub fn sitemap_entries(site_url: &str, now: DateTime<Utc>) -> Vec<SitemapEntry> {
    let base = site_url.trim_end_matches('/');
    SITEMAP_ROUTES
        .iter()
        .map(|(path, frequency, priority)| SitemapEntry {
            url: format!("{}{}", base, path),
            last_modified: now,
            change_frequency: frequency.to_string(),
            priority: *priority,
        })
        .collect()
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Render entries as a sitemaps.org urlset document
pub fn sitemap_xml(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        xml.push_str(&format!(
            "<url>\n<loc>{}</loc>\n<lastmod>{}</lastmod>\n<changefreq>{}</changefreq>\n<priority>{:.1}</priority>\n</url>\n",
            escape_xml(&entry.url),
            entry.last_modified.to_rfc3339(),
            entry.change_frequency,
            entry.priority
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}
