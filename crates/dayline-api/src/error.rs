//! Error types for dayline-api

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use dayline_core::Error as CoreError;

use crate::handlers::ErrorResponse;

/// dayline-api error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Too many login attempts, try again later")]
    TooManyRequests,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Core(e) => match e {
                CoreError::Validation(_) | CoreError::LoginTaken(_) => StatusCode::BAD_REQUEST,
                CoreError::InvalidCredentials | CoreError::InvalidToken(_) => {
                    StatusCode::UNAUTHORIZED
                }
                CoreError::TaskNotFound(_) | CoreError::UserNotFound(_) => StatusCode::NOT_FOUND,
                CoreError::Database(_)
                | CoreError::Json(_)
                | CoreError::Io(_)
                | CoreError::Config(_)
                | CoreError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for ApiError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ApiError::Core(CoreError::from(e))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Core(CoreError::InvalidToken(_)) => "Invalid token".to_string(),
            ApiError::Core(CoreError::TaskNotFound(_)) => "Task not found".to_string(),
            ApiError::Core(CoreError::UserNotFound(_)) => "User not found".to_string(),
            _ if status.is_server_error() => {
                error!("Request failed: {}", self);
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
