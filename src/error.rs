//! Error types for llm-relay
//!
//! Routing and configuration failures become deterministic HTTP responses.
//! Upstream HTTP errors are not represented here: they are forwarded verbatim.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Provider '{provider}' is not configured: {env_var} is not set")]
    MissingCredential { provider: String, env_var: String },

    #[error("Provider credential is not a valid header value")]
    InvalidCredential,

    #[error("Upstream timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::UpstreamTimeout(err.to_string())
        } else {
            AppError::UpstreamUnreachable(err)
        }
    }
}

impl AppError {
    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::UnknownProvider(_) => "unknown_provider",
            AppError::Unauthorized => "unauthorized",
            AppError::MissingCredential { .. } => "missing_credential",
            AppError::InvalidCredential => "invalid_credential",
            AppError::UpstreamTimeout(_) => "timeout",
            AppError::UpstreamUnreachable(_) => "unreachable",
            AppError::Internal(_) => "internal",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::UnknownProvider(_) => {
                return (
                    StatusCode::NOT_FOUND,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    "Unknown provider",
                )
                    .into_response();
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            AppError::MissingCredential { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "PROVIDER_NOT_CONFIGURED",
                self.to_string(),
            ),
            AppError::InvalidCredential => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INVALID_CREDENTIAL",
                self.to_string(),
            ),
            AppError::UpstreamTimeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                "UPSTREAM_TIMEOUT",
                "Upstream service timed out".to_string(),
            ),
            AppError::UpstreamUnreachable(_) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "Upstream service unreachable".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
