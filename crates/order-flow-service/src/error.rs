//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use order_flow_core::{OrderError, Violation};
use order_flow_store::StoreError;

use crate::intake::IntakeError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The `Idempotency-Key` header is missing or blank.
    #[error("missing idempotency key")]
    MissingIdempotencyKey,

    /// The request body failed validation.
    #[error("validation failed")]
    Validation(Vec<Violation>),

    /// Internal server error. The message is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::MissingIdempotencyKey => (
                StatusCode::BAD_REQUEST,
                "missing_idempotency_key",
                "Idempotency-Key header is required".to_string(),
                None,
            ),
            Self::Validation(violations) => (
                StatusCode::BAD_REQUEST,
                "validation_failed",
                "Request validation failed".to_string(),
                Some(serde_json::json!({ "errors": violations })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(order_id) => Self::NotFound(format!("order not found: {order_id}")),
            StoreError::Database(_) | StoreError::Serialization(_) | StoreError::AlreadyExists(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::MissingIdempotencyKey => Self::MissingIdempotencyKey,
            IntakeError::Invalid(OrderError::Validation(violations)) => Self::Validation(violations),
            // A failed insert or publish during creation is a server fault
            // regardless of its kind.
            IntakeError::Store(e) => Self::Internal(e.to_string()),
            IntakeError::Queue(e) => Self::Internal(e.to_string()),
        }
    }
}
