//! API Routes module for the AnimeKompi API
//!
//! Catalog handlers live here; metadata and admin handlers have their own
//! submodules.

pub mod admin;
pub mod meta;

use actix_web::{web, HttpResponse};
use chrono::{Datelike, Local};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::catalog;
use crate::collector::{PageBudget, PaginatedCollector};
use crate::config::Config;
use crate::constants::collect::{DEFAULT_PAGES, MAX_PAGES};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{
    AdminInitData, AdminLoginRequest, AdminSessionData, AdminUser, AnimeCard, AnimeDetail,
    AnimeInfo, AnimeItem, ApiError, ApiResponse, ChangePasswordRequest, CollectedFeed, DownloadLink,
    DownloadProvider, EpisodeRef, FeedView, ScheduleDay, SeoSettings, SeoSettingsUpdate, SlugRoute,
    StreamingServer, WatchView,
};
use crate::seo::{AnimeMetadata, SiteMetadata};
use crate::slug::{self, SlugKind};
use crate::upstream::{Feed, FeedSource, UpstreamClient, UpstreamError};

/// Application state shared across handlers
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub upstream: Arc<UpstreamClient>,
}

/// Query parameters for paginated feeds
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// 1-based page number, defaults to 1
    pub page: Option<u32>,
}

impl PageQuery {
    fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Query parameters for the search endpoint
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SearchQuery {
    /// Search keyword
    pub q: Option<String>,
    pub page: Option<u32>,
}

/// Query parameters for the episode list
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EpisodeQuery {
    /// Matches episode label or title, case-insensitive
    pub q: Option<String>,
}

/// Query parameters for the collect endpoint
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct CollectQuery {
    /// Search keyword, required for the search feed
    pub q: Option<String>,
    /// Total pages to load including the first, defaults to 5, at most 50
    pub pages: Option<u32>,
}

/// Map an upstream failure on a single-record lookup
///
/// A record the upstream cannot produce is reported as missing; transport
/// failures stay gateway errors.
fn lookup_error(what: &str, err: UpstreamError) -> AppError {
    match err {
        UpstreamError::Parse(_) | UpstreamError::Http(404) => {
            AppError::not_found(format!("{} not found", what))
        }
        other => AppError::Upstream(other),
    }
}

/// GET /api/home - Latest releases
///
/// The first page also carries the hero slides.
#[utoipa::path(
    get,
    path = "/api/home",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "Latest releases page", body = FeedView),
        (status = 502, description = "Upstream unavailable", body = ApiError)
    )
)]
pub async fn get_home(
    data: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = query.page();
    let feed = data.upstream.home(page).await?;
    info!("Home page {} with {} items", page, feed.anime.len());
    Ok(HttpResponse::Ok().json(ApiResponse::new(catalog::feed_view(
        feed,
        page == 1,
    ))))
}

/// GET /api/batch - Batch releases
#[utoipa::path(
    get,
    path = "/api/batch",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "Batch releases page", body = FeedView),
        (status = 502, description = "Upstream unavailable", body = ApiError)
    )
)]
pub async fn get_batch(
    data: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let feed = data.upstream.batch(query.page()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(catalog::feed_view(feed, false))))
}

/// GET /api/search - Search the catalog
#[utoipa::path(
    get,
    path = "/api/search",
    tag = "catalog",
    params(SearchQuery),
    responses(
        (status = 200, description = "Search results page", body = FeedView),
        (status = 400, description = "Missing query", body = ApiError),
        (status = 502, description = "Upstream unavailable", body = ApiError)
    )
)]
pub async fn search_anime(
    data: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let keyword = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::validation("Query parameter 'q' is required"))?;
    let page = query.page.unwrap_or(1).max(1);

    info!("Searching for '{}' page {}", keyword, page);
    let feed = data.upstream.search(keyword, page).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(catalog::feed_view(feed, false))))
}

/// GET /api/anime/{slug} - Series detail
#[utoipa::path(
    get,
    path = "/api/anime/{slug}",
    tag = "catalog",
    params(
        ("slug" = String, Path, description = "Series slug")
    ),
    responses(
        (status = 200, description = "Series detail", body = AnimeDetail),
        (status = 404, description = "Series not found", body = ApiError),
        (status = 502, description = "Upstream unavailable", body = ApiError)
    )
)]
pub async fn get_anime_by_slug(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let detail = data
        .upstream
        .detail(&slug)
        .await
        .map_err(|e| lookup_error("Anime", e))?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(detail)))
}

/// GET /api/anime/{slug}/episodes - Episode list with optional filter
#[utoipa::path(
    get,
    path = "/api/anime/{slug}/episodes",
    tag = "catalog",
    params(
        ("slug" = String, Path, description = "Series slug"),
        EpisodeQuery
    ),
    responses(
        (status = 200, description = "Matching episodes, newest first", body = Vec<EpisodeRef>),
        (status = 404, description = "Series not found", body = ApiError)
    )
)]
pub async fn get_episodes(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<EpisodeQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let detail = data
        .upstream
        .detail(&slug)
        .await
        .map_err(|e| lookup_error("Anime", e))?;

    let episodes: Vec<EpisodeRef> =
        catalog::filter_episodes(&detail.episodes, query.q.as_deref().unwrap_or(""))
            .into_iter()
            .cloned()
            .collect();
    Ok(HttpResponse::Ok().json(ApiResponse::new(episodes)))
}

/// GET /api/watch/{slug} - Stream links and episode navigation
///
/// Navigation comes from the parent series detail and is left empty when
/// that lookup fails.
#[utoipa::path(
    get,
    path = "/api/watch/{slug}",
    tag = "catalog",
    params(
        ("slug" = String, Path, description = "Episode slug")
    ),
    responses(
        (status = 200, description = "Watch data", body = WatchView),
        (status = 404, description = "Episode not found", body = ApiError),
        (status = 502, description = "Upstream unavailable", body = ApiError)
    )
)]
pub async fn get_watch(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let watch = data
        .upstream
        .watch(&slug)
        .await
        .map_err(|e| lookup_error("Episode", e))?;

    let series = slug::series_slug(&slug);
    let (previous_episode, next_episode) = if series != slug {
        match data.upstream.detail(series).await {
            Ok(detail) => catalog::episode_navigation(&detail.episodes, &slug),
            Err(e) => {
                warn!("No navigation for {}: {}", slug, e);
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    let view = WatchView {
        series_slug: series.to_string(),
        episode_number: slug::episode_number(&slug).map(str::to_string),
        title: watch.title,
        streaming_servers: watch.streaming_servers,
        download_links: watch.download_links,
        previous_episode,
        next_episode,
        slug,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::new(view)))
}

/// GET /api/schedule - Weekly schedule starting today
#[utoipa::path(
    get,
    path = "/api/schedule",
    tag = "catalog",
    responses(
        (status = 200, description = "Schedule days in order from today", body = Vec<ScheduleDay>),
        (status = 502, description = "Upstream unavailable", body = ApiError)
    )
)]
pub async fn get_schedule(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let schedule = data.upstream.schedule().await?;
    let days = catalog::order_schedule(&schedule, Local::now().weekday());
    Ok(HttpResponse::Ok().json(ApiResponse::new(days)))
}

/// GET /api/resolve/{slug} - Classify a slug and return its route
#[utoipa::path(
    get,
    path = "/api/resolve/{slug}",
    tag = "catalog",
    params(
        ("slug" = String, Path, description = "Series or episode slug")
    ),
    responses(
        (status = 200, description = "Slug routing information", body = SlugRoute)
    )
)]
pub async fn resolve_slug(path: web::Path<String>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::new(catalog::resolve(&path)))
}

/// POST /api/collect/{feed} - Collect several pages of a feed
///
/// Loads the first page, then keeps loading deduplicated pages until the
/// page budget runs out or the feed is exhausted.
#[utoipa::path(
    post,
    path = "/api/collect/{feed}",
    tag = "catalog",
    params(
        ("feed" = String, Path, description = "home, batch or search"),
        CollectQuery
    ),
    responses(
        (status = 200, description = "Collected items", body = CollectedFeed),
        (status = 400, description = "Missing search query", body = ApiError),
        (status = 404, description = "Unknown feed", body = ApiError),
        (status = 502, description = "First page unavailable", body = ApiError)
    )
)]
pub async fn collect_feed(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<CollectQuery>,
) -> AppResult<HttpResponse> {
    let name = path.into_inner();
    let feed = match Feed::from_name(&name, query.q.as_deref()) {
        Some(feed) => feed,
        None if name == "search" => {
            return Err(AppError::validation("Query parameter 'q' is required"))
        }
        None => return Err(AppError::not_found(format!("Unknown feed '{}'", name))),
    };
    let pages = query.pages.unwrap_or(DEFAULT_PAGES).clamp(1, MAX_PAGES);

    let first = feed.fetch(&data.upstream, 1).await?;
    let collector = PaginatedCollector::new(
        FeedSource::new(Arc::clone(&data.upstream), feed.clone()),
        first.anime,
        first.page.max(1),
    )
    .with_total_pages(first.total_pages);

    collector.run(&mut PageBudget::new(pages - 1)).await;

    let collected = CollectedFeed {
        feed: feed.to_string(),
        last_page: collector.current_page(),
        exhausted: collector.is_exhausted(),
        last_error: collector.last_error().map(|e| e.to_string()),
        items: collector.into_items(),
    };
    info!(
        "Collected {} items from {} over {} pages",
        collected.items.len(),
        collected.feed,
        collected.last_page
    );
    Ok(HttpResponse::Ok().json(ApiResponse::new(collected)))
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "AnimeKompi API",
        version = "0.1.0",
        description = "Catalog, metadata and admin API for the AnimeKompi streaming portal",
        license(
            name = "MIT"
        )
    ),
    paths(
        get_home,
        get_batch,
        search_anime,
        get_anime_by_slug,
        get_episodes,
        get_watch,
        get_schedule,
        resolve_slug,
        collect_feed,
        meta::get_site_meta,
        meta::get_anime_meta,
        meta::get_sitemap,
        admin::init_admin,
        admin::login,
        admin::logout,
        admin::change_password,
        admin::get_seo_settings,
        admin::update_seo_settings
    ),
    components(
        schemas(
            AnimeItem,
            AnimeCard,
            FeedView,
            AnimeDetail,
            AnimeInfo,
            EpisodeRef,
            StreamingServer,
            DownloadLink,
            DownloadProvider,
            WatchView,
            ScheduleDay,
            SlugRoute,
            SlugKind,
            CollectedFeed,
            SiteMetadata,
            AnimeMetadata,
            SeoSettings,
            SeoSettingsUpdate,
            AdminUser,
            AdminLoginRequest,
            AdminSessionData,
            AdminInitData,
            ChangePasswordRequest,
            ApiError,
            PageQuery,
            SearchQuery,
            EpisodeQuery,
            CollectQuery
        )
    ),
    tags(
        (name = "catalog", description = "Catalog browsing endpoints"),
        (name = "meta", description = "Search-engine metadata"),
        (name = "admin", description = "Admin session and site settings")
    )
)]
pub struct ApiDoc;

/// Configure API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/sitemap.xml", web::get().to(meta::get_sitemap))
        .service(
            web::scope("/api")
                .route("/home", web::get().to(get_home))
                .route("/batch", web::get().to(get_batch))
                .route("/search", web::get().to(search_anime))
                .route("/anime/{slug}", web::get().to(get_anime_by_slug))
                .route("/anime/{slug}/episodes", web::get().to(get_episodes))
                .route("/watch/{slug}", web::get().to(get_watch))
                .route("/schedule", web::get().to(get_schedule))
                .route("/resolve/{slug}", web::get().to(resolve_slug))
                .route("/collect/{feed}", web::post().to(collect_feed))
                .configure(meta::configure)
                .configure(admin::configure),
        );
}
