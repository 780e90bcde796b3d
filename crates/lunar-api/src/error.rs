use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lunar_persist::StoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Failed to convert messages: {0}")]
    MessageConversion(String),

    #[error("Chat not found: {0}")]
    NotFound(String),

    #[error("Forbidden: chat {0} belongs to another user")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Generation failed: {0}")]
    Upstream(#[source] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Validation(_) | ApiError::MessageConversion(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::Store(ref e) => match e {
                StoreError::ChatNotFound(id) | StoreError::InvalidObjectId(id) => {
                    (StatusCode::NOT_FOUND, format!("Chat not found: {}", id))
                }
                StoreError::Forbidden(id) => (
                    StatusCode::FORBIDDEN,
                    format!("Forbidden: chat {} belongs to another user", id),
                ),
                StoreError::InvalidTitle(msg) => {
                    (StatusCode::BAD_REQUEST, format!("Invalid title: {}", msg))
                }
                _ => {
                    tracing::error!("Storage error: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
                }
            },
            ApiError::Upstream(ref e) => {
                tracing::error!("Upstream generation error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Generation failed".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
