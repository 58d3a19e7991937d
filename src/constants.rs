//! Constants module for the AnimeKompi API
//!
//! Contains upstream URL builders that take the base URL from configuration,
//! plus fixed site values.

/// Default upstream catalog API base
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://zeldvorik.ru/animekompi/endpoints";

/// Default public site address used for sitemaps and canonical links
pub const DEFAULT_SITE_URL: &str = "https://animekompi.fun";

/// URL builder functions for all upstream endpoints
pub mod endpoints {
    /// Latest releases feed
    pub fn home(base_url: &str, page: u32) -> String {
        format!("{}/home.php?page={}", base_url, page)
    }

    /// Batch (complete series) feed
    pub fn batch(base_url: &str, page: u32) -> String {
        format!("{}/batch.php?page={}", base_url, page)
    }

    /// Search URL with query parameter
    pub fn search(base_url: &str, query: &str, page: u32) -> String {
        format!(
            "{}/search.php?q={}&page={}",
            base_url,
            urlencoding::encode(query),
            page
        )
    }

    /// Series detail URL
    pub fn detail(base_url: &str, slug: &str) -> String {
        format!("{}/detail.php?slug={}", base_url, urlencoding::encode(slug))
    }

    /// Episode stream/download URL
    pub fn watch(base_url: &str, slug: &str) -> String {
        format!("{}/watch.php?slug={}", base_url, urlencoding::encode(slug))
    }

    /// Weekly release schedule
    pub fn schedule(base_url: &str) -> String {
        format!("{}/schedule.php", base_url)
    }
}

/// Site-level constants
pub mod site {
    /// Weekdays as named by the schedule endpoint, Sunday first
    pub const DAY_ORDER: [&str; 7] = [
        "Minggu", "Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu",
    ];

    /// Number of hero slides on the first home page
    pub const HERO_SLIDES: usize = 5;

    /// Static sitemap entries: path, change frequency, priority
    pub const SITEMAP_ROUTES: &[(&str, &str, f32)] = &[
        ("", "hourly", 1.0),
        ("/schedule", "daily", 0.8),
        ("/batch", "daily", 0.7),
    ];

    pub const DEFAULT_SITE_NAME: &str = "AnimeKompi";
    pub const DEFAULT_TITLE: &str = "AnimeKompi - Nonton Anime Subtitle Indonesia Gratis";
    pub const TITLE_TEMPLATE: &str = "%s | AnimeKompi";
    pub const DEFAULT_DESCRIPTION: &str = "Nonton anime subtitle Indonesia terbaru dan terlengkap secara gratis. Streaming anime ongoing, completed, dan batch download dengan kualitas HD.";
    pub const DEFAULT_SHORT_DESCRIPTION: &str =
        "Nonton anime subtitle Indonesia terbaru dan terlengkap secara gratis.";
    pub const DEFAULT_KEYWORDS: &[&str] = &["anime", "nonton anime", "anime subtitle indonesia"];
    pub const DEFAULT_OG_IMAGE: &str = "/og-image.jpg";
    pub const PLACEHOLDER_IMAGE: &str = "/placeholder.png";
    pub const DEFAULT_TWITTER_HANDLE: &str = "@animekompi";
}

/// Admin bootstrap and session values
pub mod admin {
    /// Username created by the bootstrap endpoint
    pub const DEFAULT_USERNAME: &str = "admin";
    /// Password created by the bootstrap endpoint; change it right away
    pub const DEFAULT_PASSWORD: &str = "admin123";
    /// Minimum length for a new admin password
    pub const MIN_PASSWORD_LEN: usize = 6;
    /// Name of the HTTP-only session cookie
    pub const SESSION_COOKIE: &str = "admin_session";
}

/// Limits for the collect endpoint
pub mod collect {
    pub const DEFAULT_PAGES: u32 = 5;
    pub const MAX_PAGES: u32 = 50;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let base = DEFAULT_UPSTREAM_BASE_URL;
        assert_eq!(
            endpoints::home(base, 2),
            "https://zeldvorik.ru/animekompi/endpoints/home.php?page=2"
        );
        assert_eq!(endpoints::batch("http://x", 1), "http://x/batch.php?page=1");
        assert_eq!(endpoints::schedule("http://x"), "http://x/schedule.php");
        assert_eq!(
            endpoints::detail("http://x", "one-piece"),
            "http://x/detail.php?slug=one-piece"
        );
    }

    #[test]
    fn test_search_url_encodes_query() {
        assert_eq!(
            endpoints::search("http://x", "one piece&more", 3),
            "http://x/search.php?q=one%20piece%26more&page=3"
        );
    }

    #[test]
    fn test_day_order_starts_on_sunday() {
        assert_eq!(site::DAY_ORDER[0], "Minggu");
        assert_eq!(site::DAY_ORDER[6], "Sabtu");
    }
}
