//! Maps [`VizportError`] onto HTTP status codes and the JSON error envelope.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use vizport_core::{ErrorKind, VizportError};

/// `{ "success": false, "error": ..., "details": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorEnvelope {
    fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details,
        }
    }
}

/// Status code and envelope for `err`. Internal faults are logged here and
/// never leak their message.
pub fn envelope(err: &VizportError) -> (StatusCode, ErrorEnvelope) {
    match err.kind() {
        ErrorKind::InvalidRequest => {
            let message = match err {
                VizportError::InvalidRequest(message) => message.clone(),
                other => other.to_string(),
            };
            (StatusCode::BAD_REQUEST, ErrorEnvelope::new(message, None))
        }
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, ErrorEnvelope::new("not found", None)),
        ErrorKind::GenerationFailed => {
            tracing::warn!(error = %err, "generation failed");
            (
                StatusCode::BAD_GATEWAY,
                ErrorEnvelope::new(
                    "Failed to process visualization request",
                    Some(err.to_string()),
                ),
            )
        }
        ErrorKind::InternalFault => {
            tracing::error!(error = %err, "internal fault");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorEnvelope::new("internal error", None),
            )
        }
    }
}

/// Handler error type.
#[derive(Debug)]
pub struct ApiError(pub VizportError);

impl From<VizportError> for ApiError {
    fn from(value: VizportError) -> Self {
        Self(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self(VizportError::invalid(value.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = envelope(&self.0);
        (status, Json(body)).into_response()
    }
}
