//! Response shapes produced by the gateway itself.
//!
//! # Responsibilities
//! - Uniform JSON error body for gateway-generated failures
//! - Track whether a response may still be modified
//!
//! # Design Decisions
//! - Responses are owned values in the pipeline; "committed" is an explicit
//!   marker set by handlers that have already started streaming
//! - Error bodies never carry internal detail

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Response extension marking a response whose headers must not change.
#[derive(Debug, Clone, Copy, Default)]
pub struct Committed;

/// Returns true if the response can no longer be modified.
pub fn is_committed(response: &Response) -> bool {
    response.status() == StatusCode::SWITCHING_PROTOCOLS
        || response.extensions().get::<Committed>().is_some()
}

/// JSON body for gateway-generated errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub timestamp: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub details: String,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: message.into(),
            details: String::new(),
        }
    }
}

impl IntoResponse for ErrorBody {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self)).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}
