use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Failure kinds surfaced by the learning core.
///
/// Only the kind and a caller-safe message leave the process; store failures keep
/// their cause for the log and answer with a generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("recommender unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("malformed recommender response: {0}")]
    MalformedUpstreamResponse(String),
    #[error("store failure")]
    Store(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::MalformedUpstreamResponse(_) => "malformed_upstream_response",
            Self::Store(_) => "store_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UpstreamUnavailable(_) | Self::MalformedUpstreamResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::InvalidArgument(m)
            | Self::Unauthorized(m)
            | Self::NotFound(m)
            | Self::Conflict(m) => m.clone(),
            Self::UpstreamUnavailable(_) | Self::MalformedUpstreamResponse(_) => {
                "Error fetching recommendations".into()
            }
            Self::Store(_) => "internal error".into(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::Store(anyhow::Error::new(e))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidArgument(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidArgument(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::Store(e) => error!(error = ?e, "store failure"),
            Self::UpstreamUnavailable(detail) | Self::MalformedUpstreamResponse(detail) => {
                error!(kind = self.kind(), %detail, "recommender failure")
            }
            other => warn!(kind = other.kind(), message = %other, "request rejected"),
        }
        let body = Json(json!({
            "error": self.kind(),
            "message": self.public_message(),
        }));
        (self.status(), body).into_response()
    }
}
