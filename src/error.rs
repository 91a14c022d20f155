use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The backing file is missing, unreadable, unwritable or not a JSON array
    #[error("Service store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid service: {0}")]
    InvalidService(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// The homedash API answered with a non-success status
    #[error("API error: {0}")]
    Api(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // Details stay in the logs; callers get one generic message
            AppError::StoreUnavailable(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Service store unavailable".to_string(),
            ),
            AppError::InvalidService(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::ServiceNotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Api(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::RequestFailed(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            AppError::Config(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
