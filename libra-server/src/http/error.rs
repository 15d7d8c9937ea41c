//! API error type with automatic HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::DbError;

/// Errors a handler can surface, each with a fixed status code.
#[derive(Debug)]
pub enum ApiError {
    /// The request asked for something the DAL contract forbids (400).
    BadRequest { message: String },

    /// Unknown endpoint (404).
    NotFound,

    /// Database failure (500); detail is logged, not leaked.
    Database(DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "detail": message
                }),
            ),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                json!({
                    "success": false,
                    "detail": "Endpoint not found"
                }),
            ),
            Self::Database(e) => {
                tracing::error!(error = %e, "request failed on database access");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "success": false,
                        "detail": "Internal server error"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Contract(message) => Self::BadRequest { message },
            other => Self::Database(other),
        }
    }
}
