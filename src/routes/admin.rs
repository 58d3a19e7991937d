//! Admin routes for the AnimeKompi API
//!
//! - GET /api/admin/init - Create the default admin when none exists
//! - POST /api/admin/login - Login with username/password
//! - POST /api/admin/logout - Logout (clears HTTP-only cookie)
//! - POST /api/admin/change-password - Change the session admin's password
//! - GET /api/admin/seo - Read the SEO settings
//! - POST /api/admin/seo - Update the SEO settings

use actix_web::{web, HttpResponse, Responder};
use tracing::{error, info, warn};

use crate::auth::{
    create_logout_cookie, create_session_cookie, generate_token, hash_password, verify_password,
    AdminSession,
};
use crate::constants::admin::{DEFAULT_PASSWORD, DEFAULT_USERNAME, MIN_PASSWORD_LEN};
use crate::db::{
    count_admins, create_admin, find_admin_by_id, find_admin_by_username,
    get_or_create_seo_settings, update_admin_password,
};
use crate::models::{
    AdminInitData, AdminLoginRequest, AdminSessionData, ApiError, ApiResponse,
    ChangePasswordRequest, SeoSettings, SeoSettingsUpdate,
};
use crate::routes::AppState;

/// GET /api/admin/init - Bootstrap the first admin account
///
/// Does nothing once any admin exists.
#[utoipa::path(
    get,
    path = "/api/admin/init",
    tag = "admin",
    responses(
        (status = 200, description = "Admin created or already present", body = AdminInitData),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn init_admin(data: web::Data<AppState>) -> impl Responder {
    let pool = data.db.pool();

    let count = match count_admins(pool).await {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to count admins: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to initialize admin"));
        }
    };

    if count > 0 {
        return HttpResponse::Ok().json(ApiResponse::new(AdminInitData {
            created: false,
            message: "Admin already exists".to_string(),
            username: None,
            password: None,
            warning: None,
        }));
    }

    let password_hash = match hash_password(DEFAULT_PASSWORD) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Failed to hash default password: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to initialize admin"));
        }
    };

    if let Err(e) = create_admin(pool, DEFAULT_USERNAME, &password_hash).await {
        error!("Failed to create default admin: {}", e);
        return HttpResponse::InternalServerError()
            .json(ApiError::new("Failed to initialize admin"));
    }

    warn!("Default admin '{}' created", DEFAULT_USERNAME);

    HttpResponse::Ok().json(ApiResponse::new(AdminInitData {
        created: true,
        message: "Admin created".to_string(),
        username: Some(DEFAULT_USERNAME.to_string()),
        password: Some(DEFAULT_PASSWORD.to_string()),
        warning: Some("Change the default password immediately".to_string()),
    }))
}

/// POST /api/admin/login - Login with username and password
#[utoipa::path(
    post,
    path = "/api/admin/login",
    tag = "admin",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AdminSessionData),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Invalid credentials", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn login(
    data: web::Data<AppState>,
    body: web::Json<AdminLoginRequest>,
) -> impl Responder {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return HttpResponse::BadRequest()
            .json(ApiError::new("Username and password are required"));
    }

    let admin = match find_admin_by_username(data.db.pool(), body.username.trim()).await {
        Ok(Some(admin)) => admin,
        Ok(None) => {
            return HttpResponse::Unauthorized().json(ApiError::new("Invalid credentials"));
        }
        Err(e) => {
            error!("Failed to find admin: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to process login"));
        }
    };

    match verify_password(&body.password, &admin.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            return HttpResponse::Unauthorized().json(ApiError::new("Invalid credentials"));
        }
        Err(e) => {
            error!("Failed to verify password: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to process login"));
        }
    }

    let token = match generate_token(admin.id, &admin.username, &data.config.jwt_secret) {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to generate token: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to create session"));
        }
    };

    info!("Admin logged in: {}", admin.username);

    HttpResponse::Ok()
        .cookie(create_session_cookie(&token))
        .json(ApiResponse::new(AdminSessionData {
            username: admin.username,
            token,
        }))
}

/// POST /api/admin/logout - Clear the session cookie
#[utoipa::path(
    post,
    path = "/api/admin/logout",
    tag = "admin",
    responses(
        (status = 200, description = "Logged out")
    )
)]
pub async fn logout() -> impl Responder {
    HttpResponse::Ok()
        .cookie(create_logout_cookie())
        .json(ApiResponse::new("Logged out"))
}

/// POST /api/admin/change-password - Change the session admin's password
#[utoipa::path(
    post,
    path = "/api/admin/change-password",
    tag = "admin",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "New password too short", body = ApiError),
        (status = 401, description = "Not logged in or wrong current password", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn change_password(
    data: web::Data<AppState>,
    session: AdminSession,
    body: web::Json<ChangePasswordRequest>,
) -> impl Responder {
    if body.new_password.chars().count() < MIN_PASSWORD_LEN {
        return HttpResponse::BadRequest().json(ApiError::new(format!(
            "New password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let pool = data.db.pool();
    let admin = match find_admin_by_id(pool, session.admin_id).await {
        Ok(Some(admin)) => admin,
        Ok(None) => {
            return HttpResponse::Unauthorized().json(ApiError::new("Invalid session"));
        }
        Err(e) => {
            error!("Failed to find admin {}: {}", session.admin_id, e);
            return HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to change password"));
        }
    };

    match verify_password(&body.current_password, &admin.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            return HttpResponse::Unauthorized()
                .json(ApiError::new("Current password is incorrect"));
        }
        Err(e) => {
            error!("Failed to verify password: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to change password"));
        }
    }

    let password_hash = match hash_password(&body.new_password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Failed to hash password: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to change password"));
        }
    };

    if let Err(e) = update_admin_password(pool, admin.id, &password_hash).await {
        error!("Failed to update password for {}: {}", admin.username, e);
        return HttpResponse::InternalServerError()
            .json(ApiError::new("Failed to change password"));
    }

    info!("Password changed for admin: {}", session.username);
    HttpResponse::Ok().json(ApiResponse::new("Password changed"))
}

/// GET /api/admin/seo - Current SEO settings
#[utoipa::path(
    get,
    path = "/api/admin/seo",
    tag = "admin",
    responses(
        (status = 200, description = "Stored SEO settings", body = SeoSettings),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn get_seo_settings(data: web::Data<AppState>) -> impl Responder {
    match get_or_create_seo_settings(data.db.pool()).await {
        Ok(settings) => HttpResponse::Ok().json(ApiResponse::new(settings)),
        Err(e) => {
            error!("Failed to load SEO settings: {}", e);
            HttpResponse::InternalServerError().json(ApiError::new("Failed to load SEO settings"))
        }
    }
}

/// POST /api/admin/seo - Update SEO settings
///
/// Fields left out of the body keep their stored value.
#[utoipa::path(
    post,
    path = "/api/admin/seo",
    tag = "admin",
    request_body = SeoSettingsUpdate,
    responses(
        (status = 200, description = "Updated SEO settings", body = SeoSettings),
        (status = 401, description = "Not logged in", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn update_seo_settings(
    data: web::Data<AppState>,
    session: AdminSession,
    body: web::Json<SeoSettingsUpdate>,
) -> impl Responder {
    match crate::db::update_seo_settings(data.db.pool(), &body).await {
        Ok(settings) => {
            info!("SEO settings updated by {}", session.username);
            HttpResponse::Ok().json(ApiResponse::new(settings))
        }
        Err(e) => {
            error!("Failed to update SEO settings: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to update SEO settings"))
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/init", web::get().to(init_admin))
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/change-password", web::post().to(change_password))
            .route("/seo", web::get().to(get_seo_settings))
            .route("/seo", web::post().to(update_seo_settings)),
    );
}
