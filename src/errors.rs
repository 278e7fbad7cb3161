use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use std::time::Duration;

/// Label returned to callers when the analysis engine rejects a request.
pub const UPSTREAM_FAILURE_LABEL: &str = "Backend Analysis Failed";

/// Label returned to callers for any failure whose cause must not leak.
pub const INTERNAL_FAILURE_LABEL: &str = "Internal Server Error";

/// Fallback message when the engine fails without a body.
pub const EMPTY_UPSTREAM_MESSAGE: &str = "Analysis failed";

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Bad request error (invalid input).
    BadRequest(String),
    /// The analysis engine answered with a non-success status.
    Upstream {
        /// Status code returned by the engine.
        status: StatusCode,
        /// Raw response body, possibly empty.
        body: String,
    },
    /// The outbound call could not complete or its response could not be read.
    Transport(String),
    /// The outbound call exceeded its time limit.
    Timeout(Duration),
    /// Internal server error.
    InternalError(String),
}

impl AppError {
    /// Status code of the underlying engine response, if this error came from one.
    pub fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            AppError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Transport(_) | AppError::Timeout(_) => true,
            AppError::Upstream { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    ///
    /// Engine failures display the engine's own text so callers can surface it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Upstream { body, .. } => {
                if body.trim().is_empty() {
                    write!(f, "{}", EMPTY_UPSTREAM_MESSAGE)
                } else {
                    write!(f, "{}", body)
                }
            }
            AppError::Transport(msg) => write!(f, "Transport error: {}", msg),
            AppError::Timeout(limit) => {
                write!(f, "Analysis engine did not respond within {:?}", limit)
            }
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Engine failures keep the engine's status and body. Everything else is
    /// reduced to a fixed label and the cause is only logged.
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Upstream { status, body } => {
                tracing::warn!("Analysis engine returned {}: {}", status, body);
                (
                    *status,
                    json!({
                        "error": UPSTREAM_FAILURE_LABEL,
                        "details": body,
                    }),
                )
            }
            AppError::Transport(msg) => {
                tracing::error!("Proxy error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": INTERNAL_FAILURE_LABEL }),
                )
            }
            AppError::Timeout(limit) => {
                tracing::error!("Analysis engine timed out after {:?}", limit);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    json!({ "error": "Gateway Timeout" }),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": INTERNAL_FAILURE_LABEL }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
