//! Admin authentication for the AnimeKompi API
//!
//! This module provides:
//! - Password hashing with bcrypt
//! - Signed admin session tokens (JWT)
//! - HTTP-only session cookie helpers
//! - An `AdminSession` extractor for protected routes

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use thiserror::Error;

use crate::constants::admin::SESSION_COOKIE;
use crate::models::ApiError;

/// bcrypt cost factor for admin passwords
const BCRYPT_COST: u32 = 10;

/// Session lifetime in days
const SESSION_EXPIRY_DAYS: i64 = 7;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Token generation failed: {0}")]
    TokenGenerationError(String),

    #[error("Token verification failed: {0}")]
    TokenVerificationError(String),

    #[error("Session expired")]
    TokenExpired,

    #[error("Missing admin session")]
    MissingSession,

    #[error("Invalid authorization header format")]
    InvalidAuthHeaderFormat,
}

/// Admin session claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Admin username
    pub sub: String,
    /// Admin row id
    pub admin_id: i32,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| AuthError::HashingError(e.to_string()))
}

/// Verify a password against a bcrypt hash
///
/// # Returns
/// * `Ok(true)` - If the password matches
/// * `Ok(false)` - If the password doesn't match
/// * `Err(AuthError)` - If the stored hash is malformed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::HashingError(e.to_string()))
}

/// Issue a signed session token for an admin
pub fn generate_token(admin_id: i32, username: &str, secret: &str) -> Result<String, AuthError> {
    let now = Utc::now();
    let expiry = now + Duration::days(SESSION_EXPIRY_DAYS);

    let claims = Claims {
        sub: username.to_string(),
        admin_id,
        exp: expiry.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
}

/// Verify and decode a session token
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data: TokenData<Claims> = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenVerificationError(e.to_string()),
    })?;

    Ok(token_data.claims)
}

// ============================================================================
// Session cookie
// ============================================================================

/// HTTP-only cookie carrying the session token
pub fn create_session_cookie(token: &str) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_owned())
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::days(SESSION_EXPIRY_DAYS))
        .finish()
}

/// Cookie that expires the session immediately
pub fn create_logout_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::ZERO)
        .finish()
}

pub fn extract_token_from_cookie(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
}

/// Extract the token from an `Authorization: Bearer ...` header value
pub fn extract_token_from_header(auth_header: &str) -> Result<&str, AuthError> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeaderFormat)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeaderFormat);
    }

    Ok(token)
}

/// Resolve the admin session of a request
///
/// The Authorization header wins over the session cookie.
pub fn validate_http_request(req: &HttpRequest, secret: &str) -> Result<Claims, AuthError> {
    let token = if let Some(auth_header) = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        extract_token_from_header(auth_header)?.to_owned()
    } else if let Some(cookie_token) = extract_token_from_cookie(req) {
        cookie_token
    } else {
        return Err(AuthError::MissingSession);
    };

    verify_token(&token, secret)
}

/// Configuration for the session extractor
#[derive(Clone)]
pub struct AuthConfig {
    /// Secret used to sign session tokens
    pub jwt_secret: String,
}

/// A verified admin session
///
/// Adding this to a handler's arguments makes the route admin-only.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub admin_id: i32,
    pub username: String,
}

impl FromRequest for AdminSession {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let Some(config) = req.app_data::<web::Data<AuthConfig>>() else {
            tracing::error!("AuthConfig missing from app data");
            let error_response = HttpResponse::InternalServerError()
                .json(ApiError::new("Auth configuration not found"));
            return ready(Err(actix_web::error::InternalError::from_response(
                AuthError::MissingSession,
                error_response,
            )
            .into()));
        };

        let result = match validate_http_request(req, &config.jwt_secret) {
            Ok(claims) => Ok(AdminSession {
                admin_id: claims.admin_id,
                username: claims.sub,
            }),
            Err(e) => {
                let message = match &e {
                    AuthError::MissingSession => "Unauthorized",
                    AuthError::InvalidAuthHeaderFormat => "Invalid authorization header format",
                    AuthError::TokenExpired => "Session expired",
                    _ => "Invalid session",
                };
                let error_response = HttpResponse::Unauthorized().json(ApiError::new(message));
                Err(actix_web::error::InternalError::from_response(e, error_response).into())
            }
        };

        ready(result)
    }
}
