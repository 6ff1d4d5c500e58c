//! Error handling for the folio HTTP layer
//!
//! Every failure leaves the server as one JSON envelope:
//! `{"error": {"code", "message", "details", "trace_id", "timestamp"}}`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

const HIDDEN_INTERNAL_MESSAGE: &str = "An internal server error occurred";

/// Body of the `error` member of a failed response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub details: Vec<Value>,
    pub trace_id: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
struct Envelope {
    error: ErrorBody,
}

/// Failures a handler can return, one per response class
#[derive(Error, Debug)]
pub enum AppError {
    /// Payload fields failed validation; `details` lists each offending field.
    #[error("validation error: {message}")]
    Validation { message: String, details: Vec<Value> },

    /// A uniqueness rule was violated.
    #[error("conflict: {message}")]
    Conflict { message: String, details: Vec<Value> },

    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed request that never reached a handler's logic.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(details: Vec<Value>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(details: Vec<Value>, message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code clients can switch on
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::Conflict { .. } => "conflict",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn into_message_and_details(self) -> (String, Vec<Value>) {
        match self {
            AppError::Validation { message, details } | AppError::Conflict { message, details } => {
                (message, details)
            }
            AppError::NotFound(message) | AppError::BadRequest(message) => (message, Vec::new()),
            AppError::Internal(err) => (format!("{err:#}"), Vec::new()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(format!("invalid input: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::bad_request(format!("invalid path: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let trace_id = Uuid::new_v4().to_string();
        let status = self.status();
        let code = self.code();
        let (message, details) = self.into_message_and_details();

        if status.is_server_error() {
            tracing::error!(%trace_id, code, status = status.as_u16(), error = %message, "request failed");
        } else {
            tracing::warn!(%trace_id, code, status = status.as_u16(), "request rejected");
        }

        let message = if status.is_server_error() && cfg!(not(debug_assertions)) {
            HIDDEN_INTERNAL_MESSAGE.to_string()
        } else {
            message
        };

        let envelope = Envelope {
            error: ErrorBody {
                code,
                message,
                details,
                trace_id,
                timestamp: OffsetDateTime::now_utc().to_string(),
            },
        };

        (status, Json(envelope)).into_response()
    }
}
