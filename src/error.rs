//! Global error handling module for the AnimeKompi API
//!
//! This module provides a unified error type that handles all application errors
//! and converts them to appropriate HTTP responses with consistent JSON structure.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::auth::AuthError;
use crate::db::{DbError, RepositoryError};
use crate::models::ApiError;
use crate::upstream::UpstreamError;

/// Application-wide error type that unifies all error sources
#[derive(Debug, Error)]
pub enum AppError {
    /// Upstream catalog API errors (network, HTTP, parsing)
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Repository query errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Authentication-related errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Validation errors (bad request)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate resource)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,

            AppError::Auth(auth_err) => match auth_err {
                AuthError::InvalidCredentials
                | AuthError::TokenExpired
                | AuthError::MissingSession
                | AuthError::InvalidAuthHeaderFormat
                | AuthError::TokenVerificationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::HashingError(_) | AuthError::TokenGenerationError(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },

            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,

            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Repository(RepositoryError::DatabaseError(sqlx::Error::Database(e)))
                if e.is_unique_violation() =>
            {
                StatusCode::CONFLICT
            }

            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,

            AppError::Database(_) | AppError::Repository(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Internal(msg) => msg.clone(),

            AppError::Auth(auth_err) => match auth_err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::TokenExpired => "Session expired, please login again".to_string(),
                AuthError::MissingSession => "Unauthorized".to_string(),
                AuthError::InvalidAuthHeaderFormat => {
                    "Invalid authorization header format, expected 'Bearer <token>'".to_string()
                }
                AuthError::TokenVerificationError(_) => "Invalid session".to_string(),
                AuthError::HashingError(_) => "Authentication processing error".to_string(),
                AuthError::TokenGenerationError(_) => "Failed to create session".to_string(),
            },

            AppError::Upstream(upstream_err) => match upstream_err {
                UpstreamError::Network(_) => "Failed to reach the catalog server".to_string(),
                UpstreamError::Http(status) => {
                    format!("Catalog server returned error status: {}", status)
                }
                UpstreamError::RateLimited => {
                    "Catalog server is rate limiting requests, please try again later".to_string()
                }
                UpstreamError::Parse(_) => "Catalog server sent an invalid response".to_string(),
            },

            AppError::Database(db_err) => match db_err {
                DbError::ConnectionError(_) => "Database connection error".to_string(),
                DbError::MigrationError(_) => "Database migration failed".to_string(),
                DbError::HealthCheckError(_) => "Database health check failed".to_string(),
            },

            AppError::Repository(RepositoryError::NotFound(what)) => {
                format!("{} not found", what)
            }
            AppError::Repository(_) if self.status_code() == StatusCode::CONFLICT => {
                "Resource already exists".to_string()
            }
            AppError::Repository(_) => "Database operation failed".to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        HttpResponse::build(status).json(ApiError::new(self.user_message()))
    }
}

/// Result type alias for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;
