use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    InternalServerError,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Todo not found".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("rejected request body: {}", rejection.body_text());
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                AppError::BadRequest("Request body is required".to_string())
            }
            JsonRejection::JsonSyntaxError(_) => {
                AppError::BadRequest("Invalid JSON body".to_string())
            }
            JsonRejection::JsonDataError(err) => AppError::BadRequest(err.body_text()),
            _ => AppError::BadRequest("Request body is required".to_string()),
        }
    }
}

// Ids are positive integers; anything else in the path cannot name a row.
impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::NotFound
    }
}

/// Coarse, caller-safe description of a storage failure.
pub fn describe_storage_error(err: &sqlx::Error) -> &'static str {
    match err {
        sqlx::Error::PoolTimedOut => "connection pool timed out",
        sqlx::Error::PoolClosed => "connection pool closed",
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => "database unreachable",
        sqlx::Error::Configuration(_) => "database misconfigured",
        _ => "database query failed",
    }
}
