//! API error handling

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quizbattle_core::game::ErrorCategory;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Map a room actor's `Outcome::Rejected` onto the HTTP status its
    /// `ErrorCategory` names per `spec.md` §7's propagation policy, rather than
    /// collapsing every rejection to 400.
    pub fn from_room_rejection(category: ErrorCategory, code: &str, message: &str) -> Self {
        let formatted = format!("{code}: {message}");
        match category {
            ErrorCategory::Forbidden => ApiError::Forbidden(formatted),
            ErrorCategory::NotFound => ApiError::NotFound(formatted),
            ErrorCategory::Validation | ErrorCategory::Conflict => ApiError::BadRequest(formatted),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
