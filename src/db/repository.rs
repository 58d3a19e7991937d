//! Repository module for admin accounts and SEO settings
//!
//! `admin_users` holds the admin logins; `seo_settings` holds a single row of
//! site-wide metadata that is created on first read.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use thiserror::Error;

use crate::models::{SeoSettings, SeoSettingsUpdate};

/// Repository-related errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Admin row including its password hash
#[derive(Debug, Clone)]
pub struct AdminRecord {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<AdminRecord> for crate::models::AdminUser {
    fn from(record: AdminRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Admin Users Repository
// ============================================================================

pub async fn count_admins(pool: &PgPool) -> RepositoryResult<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM admin_users")
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count"))
}

/// Insert a new admin; fails on a duplicate username
pub async fn create_admin(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
) -> RepositoryResult<AdminRecord> {
    let row = sqlx::query(
        r#"
        INSERT INTO admin_users (username, password_hash)
        VALUES ($1, $2)
        RETURNING id, username, password_hash, created_at
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    Ok(admin_from_row(&row))
}

pub async fn find_admin_by_username(
    pool: &PgPool,
    username: &str,
) -> RepositoryResult<Option<AdminRecord>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, password_hash, created_at
        FROM admin_users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(admin_from_row))
}

pub async fn find_admin_by_id(pool: &PgPool, id: i32) -> RepositoryResult<Option<AdminRecord>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, password_hash, created_at
        FROM admin_users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(admin_from_row))
}

pub async fn update_admin_password(
    pool: &PgPool,
    id: i32,
    password_hash: &str,
) -> RepositoryResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE admin_users
        SET password_hash = $2, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(password_hash)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(format!("admin {}", id)));
    }
    Ok(())
}

/// Test cleanup helper
#[cfg(test)]
pub async fn delete_admin(pool: &PgPool, username: &str) -> RepositoryResult<bool> {
    let result = sqlx::query("DELETE FROM admin_users WHERE username = $1")
        .bind(username)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn admin_from_row(row: &PgRow) -> AdminRecord {
    AdminRecord {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// SEO Settings Repository
// ============================================================================

const SEO_COLUMNS: &str = "id, site_name, site_description, google_verification, \
    bing_verification, yandex_verification, google_analytics_id, facebook_pixel_id, \
    meta_description, meta_keywords, og_image, twitter_handle, updated_at";

/// Read the settings row, creating an all-defaults row if there is none
pub async fn get_or_create_seo_settings(pool: &PgPool) -> RepositoryResult<SeoSettings> {
    let select = format!("SELECT {} FROM seo_settings ORDER BY id LIMIT 1", SEO_COLUMNS);
    if let Some(row) = sqlx::query(&select).fetch_optional(pool).await? {
        return Ok(seo_from_row(&row));
    }

    tracing::info!("No SEO settings found, creating defaults");
    let insert = format!("INSERT INTO seo_settings DEFAULT VALUES RETURNING {}", SEO_COLUMNS);
    let row = sqlx::query(&insert).fetch_one(pool).await?;
    Ok(seo_from_row(&row))
}

/// Apply a partial update; `None` fields keep their stored value
pub async fn update_seo_settings(
    pool: &PgPool,
    update: &SeoSettingsUpdate,
) -> RepositoryResult<SeoSettings> {
    let current = get_or_create_seo_settings(pool).await?;

    let query = format!(
        r#"
        UPDATE seo_settings SET
            site_name = COALESCE($2, site_name),
            site_description = COALESCE($3, site_description),
            google_verification = COALESCE($4, google_verification),
            bing_verification = COALESCE($5, bing_verification),
            yandex_verification = COALESCE($6, yandex_verification),
            google_analytics_id = COALESCE($7, google_analytics_id),
            facebook_pixel_id = COALESCE($8, facebook_pixel_id),
            meta_description = COALESCE($9, meta_description),
            meta_keywords = COALESCE($10, meta_keywords),
            og_image = COALESCE($11, og_image),
            twitter_handle = COALESCE($12, twitter_handle),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING {}
        "#,
        SEO_COLUMNS
    );

    let row = sqlx::query(&query)
        .bind(current.id)
        .bind(&update.site_name)
        .bind(&update.site_description)
        .bind(&update.google_verification)
        .bind(&update.bing_verification)
        .bind(&update.yandex_verification)
        .bind(&update.google_analytics_id)
        .bind(&update.facebook_pixel_id)
        .bind(&update.meta_description)
        .bind(&update.meta_keywords)
        .bind(&update.og_image)
        .bind(&update.twitter_handle)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("seo_settings".to_string()))?;

    Ok(seo_from_row(&row))
}

fn seo_from_row(row: &PgRow) -> SeoSettings {
    SeoSettings {
        id: row.get("id"),
        site_name: row.get("site_name"),
        site_description: row.get("site_description"),
        google_verification: row.get("google_verification"),
        bing_verification: row.get("bing_verification"),
        yandex_verification: row.get("yandex_verification"),
        google_analytics_id: row.get("google_analytics_id"),
        facebook_pixel_id: row.get("facebook_pixel_id"),
        meta_description: row.get("meta_description"),
        meta_keywords: row.get("meta_keywords"),
        og_image: row.get("og_image"),
        twitter_handle: row.get("twitter_handle"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at").to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_record_into_api_user_drops_hash() {
        let record = AdminRecord {
            id: 1,
            username: "admin".to_string(),
            password_hash: "$2b$10$secret".to_string(),
            created_at: Utc::now(),
        };

        let user: crate::models::AdminUser = record.into();
        assert_eq!(user.username, "admin");
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::NotFound("admin 9".to_string());
        assert_eq!(err.to_string(), "Record not found: admin 9");
    }

    // Integration tests that require a database connection
    // These are marked with #[ignore] and can be run with `cargo test -- --ignored`

    async fn test_pool() -> PgPool {
        dotenvy::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPool::connect(&database_url).await.expect("Failed to connect");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to migrate");
        pool
    }

    #[tokio::test]
    #[ignore]
    async fn test_admin_crud() {
        let pool = test_pool().await;
        let username = "test-admin-crud";
        let _ = delete_admin(&pool, username).await;

        let created = create_admin(&pool, username, "hash-1").await.expect("Failed to create");
        assert_eq!(created.username, username);

        let found = find_admin_by_username(&pool, username)
            .await
            .expect("Failed to fetch")
            .expect("Should find admin");
        assert_eq!(found.id, created.id);
        assert!(count_admins(&pool).await.expect("Failed to count") >= 1);

        update_admin_password(&pool, created.id, "hash-2")
            .await
            .expect("Failed to update");
        let found = find_admin_by_id(&pool, created.id)
            .await
            .expect("Failed to fetch")
            .expect("Should find admin");
        assert_eq!(found.password_hash, "hash-2");

        // Usernames are unique
        assert!(create_admin(&pool, username, "hash-3").await.is_err());

        assert!(delete_admin(&pool, username).await.expect("Failed to delete"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_update_password_for_missing_admin() {
        let pool = test_pool().await;
        let result = update_admin_password(&pool, i32::MAX, "hash").await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    #[ignore]
    async fn test_seo_settings_partial_update() {
        let pool = test_pool().await;

        let before = get_or_create_seo_settings(&pool).await.expect("Failed to fetch");
        let again = get_or_create_seo_settings(&pool).await.expect("Failed to fetch");
        assert_eq!(before.id, again.id, "Should reuse the single row");

        let update = SeoSettingsUpdate {
            meta_description: Some("Nonton anime gratis".to_string()),
            ..SeoSettingsUpdate::default()
        };
        let after = update_seo_settings(&pool, &update).await.expect("Failed to update");

        assert_eq!(after.meta_description, "Nonton anime gratis");
        assert_eq!(after.site_name, before.site_name);
        assert_eq!(after.og_image, before.og_image);
    }
}
