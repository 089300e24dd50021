//! Binding error types

use crate::negotiate::Format;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type for binding operations
pub type Result<T> = std::result::Result<T, BindError>;

/// Errors surfaced by the binding layer.
///
/// Route-misses (locator found nothing, client accepts neither JSON nor XML)
/// are not errors; they are reported as [`crate::RouteResult::Deferred`].
#[derive(Error, Debug)]
pub enum BindError {
    /// Request body or `model` field is not a JSON object
    #[error("Failed to parse request params: {0}")]
    Parse(#[from] serde_json::Error),

    /// Query string or urlencoded body could not be decoded
    #[error("Failed to decode form params: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    /// Object has neither a native serializer nor a mapping form
    #[error("Cannot convert object to {format}: no native serializer and no mapping form")]
    Conversion { format: Format },

    /// Encoder rejected the mapping
    #[error("Failed to encode {format} response: {message}")]
    Encode { format: Format, message: String },

    /// Failure raised by the caller's model (set, save, destroy, lookup)
    #[error(transparent)]
    Model(#[from] anyhow::Error),

    /// Request body could not be read
    #[error("Failed to read request body: {0}")]
    Body(String),

    /// Path pattern rejected at registration
    #[error("Invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl BindError {
    /// HTTP status the host answers with when this error reaches it.
    pub fn status(&self) -> StatusCode {
        match self {
            BindError::Parse(_) | BindError::Form(_) | BindError::Body(_) => {
                StatusCode::BAD_REQUEST
            }
            BindError::Conversion { .. }
            | BindError::Encode { .. }
            | BindError::Model(_)
            | BindError::InvalidPattern { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BindError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!("Request failed with {}: {}", status, self);

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
