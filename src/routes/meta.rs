//! Metadata routes: site metadata, per-series metadata and the sitemap

use actix_web::{web, HttpResponse};
use chrono::Utc;
use tracing::warn;

use crate::db::get_or_create_seo_settings;
use crate::error::AppResult;
use crate::models::{ApiError, ApiResponse};
use crate::routes::{lookup_error, AppState};
use crate::seo::{self, AnimeMetadata, SiteMetadata};

/// GET /api/meta/site - Site metadata from stored settings
///
/// Falls back to built-in defaults when the settings cannot be read.
#[utoipa::path(
    get,
    path = "/api/meta/site",
    tag = "meta",
    responses(
        (status = 200, description = "Site metadata", body = SiteMetadata)
    )
)]
pub async fn get_site_meta(data: web::Data<AppState>) -> HttpResponse {
    let settings = match get_or_create_seo_settings(data.db.pool()).await {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!("Failed to load SEO settings, using defaults: {}", e);
            None
        }
    };

    let meta = seo::site_metadata(settings.as_ref(), &data.config.site_url);
    HttpResponse::Ok().json(ApiResponse::new(meta))
}

/// GET /api/meta/anime/{slug} - Series metadata with JSON-LD
#[utoipa::path(
    get,
    path = "/api/meta/anime/{slug}",
    tag = "meta",
    params(
        ("slug" = String, Path, description = "Series slug")
    ),
    responses(
        (status = 200, description = "Series metadata", body = AnimeMetadata),
        (status = 404, description = "Series not found", body = ApiError)
    )
)]
pub async fn get_anime_meta(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let detail = data
        .upstream
        .detail(&path)
        .await
        .map_err(|e| lookup_error("Anime", e))?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(seo::anime_metadata(&detail))))
}

/// GET /sitemap.xml
#[utoipa::path(
    get,
    path = "/sitemap.xml",
    tag = "meta",
    responses(
        (status = 200, description = "Sitemap document", content_type = "application/xml", body = String)
    )
)]
pub async fn get_sitemap(data: web::Data<AppState>) -> HttpResponse {
    let entries = seo::sitemap_entries(&data.config.site_url, Utc::now());
    HttpResponse::Ok()
        .content_type("application/xml; charset=utf-8")
        .body(seo::sitemap_xml(&entries))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/meta")
            .route("/site", web::get().to(get_site_meta))
            .route("/anime/{slug}", web::get().to(get_anime_meta)),
    );
}
