/// Server error types
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use worklog_core::{DomainError, ErrorKind, Forbidden};
use worklog_storage::StorageError;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Tags used on the wire besides the domain ones
pub mod tags {
    pub const NO_TOKEN: &str = "no_token";
    pub const BAD_TOKEN: &str = "bad_token";
    pub const AUTH_ERROR: &str = "auth_error";
    pub const FORBIDDEN: &str = "forbidden";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

#[derive(Debug, Error)]
pub enum ServerError {
    /// Missing or invalid credentials (401)
    #[error("Authentication failed: {0}")]
    Auth(&'static str),

    /// Authenticated, but not allowed to do this (403)
    #[error("Authorization failed: {0}")]
    Forbidden(String),

    /// Rejected input, missing entity or integrity conflict (422)
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A request-level problem with its own tag (422)
    #[error("Invalid request: {0}")]
    Invalid(&'static str),

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl From<StorageError> for ServerError {
    fn from(err: StorageError) -> Self {
        // Translated failures are the caller's problem, the rest are ours
        match err {
            StorageError::Domain(domain) => ServerError::Domain(domain),
            other => ServerError::Storage(other),
        }
    }
}

impl From<ErrorKind> for ServerError {
    fn from(kind: ErrorKind) -> Self {
        ServerError::Domain(DomainError::new(kind))
    }
}

impl From<Forbidden> for ServerError {
    fn from(err: Forbidden) -> Self {
        ServerError::Forbidden(err.to_string())
    }
}

impl From<JsonRejection> for ServerError {
    fn from(err: JsonRejection) -> Self {
        ServerError::Domain(DomainError::with_message(ErrorKind::BadFormat, err.body_text()))
    }
}

impl From<QueryRejection> for ServerError {
    fn from(err: QueryRejection) -> Self {
        ServerError::Domain(DomainError::with_message(ErrorKind::BadFormat, err.body_text()))
    }
}

impl ServerError {
    /// HTTP status and wire tag
    pub fn status_and_tag(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::Auth(tag) => (StatusCode::UNAUTHORIZED, *tag),
            ServerError::Jwt(_) => (StatusCode::UNAUTHORIZED, tags::AUTH_ERROR),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, tags::FORBIDDEN),
            ServerError::Domain(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.kind().as_str()),
            ServerError::Invalid(tag) => (StatusCode::UNPROCESSABLE_ENTITY, *tag),
            ServerError::Storage(_)
            | ServerError::Config(_)
            | ServerError::Internal(_)
            | ServerError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, tags::INTERNAL_ERROR),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, tag) = self.status_and_tag();

        match &self {
            ServerError::Storage(e) => tracing::error!("Storage error: {:?}", e),
            ServerError::Config(msg) => tracing::error!("Config error: {}", msg),
            ServerError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            ServerError::Io(e) => tracing::error!("IO error: {:?}", e),
            ServerError::Forbidden(msg) => tracing::warn!("{}", msg),
            ServerError::Jwt(e) => tracing::debug!("JWT error: {}", e),
            ServerError::Auth(_) | ServerError::Domain(_) | ServerError::Invalid(_) => {
                tracing::debug!("Request rejected: {}", self);
            }
        }

        let body = Json(json!({
            "error": tag,
        }));

        (status, body).into_response()
    }
}
