use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sea_orm::DbErr;
use thiserror::Error;

/// Error taxonomy shared by the engine and the HTTP facade.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    #[error("metric source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("storage error: {0}")]
    Storage(#[from] DbErr),
}

impl AlertError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AlertError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AlertError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AlertError::Conflict(msg.into())
    }
}

impl IntoResponse for AlertError {
    fn into_response(self) -> Response {
        let status = match &self {
            AlertError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AlertError::Conflict(_) | AlertError::InvalidTransition(_) => StatusCode::CONFLICT,
            AlertError::NotFound(_) => StatusCode::NOT_FOUND,
            AlertError::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AlertError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self);
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AlertError>;
