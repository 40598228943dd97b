//! Authentication failures and their client-facing shape.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::http::response::ErrorBody;
use crate::observability::metrics;

/// Every way authentication can fail. All map to 401 with a uniform body;
/// the underlying cause is only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No authentication token found")]
    NoCredential,

    #[error("Invalid authentication token")]
    InvalidCredential,

    #[error("Token processing error")]
    ProcessingError,
}

impl AuthError {
    /// Label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::NoCredential => "no_credential",
            AuthError::InvalidCredential => "invalid_credential",
            AuthError::ProcessingError => "processing_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        metrics::record_auth_failure(self.kind());
        ErrorBody::new(self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[tokio::test]
    async fn test_error_response_shape() {
        let response = AuthError::NoCredential.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 401);
        assert_eq!(body["error"], "Unauthorized");
        assert_eq!(body["message"], "No authentication token found");
        assert_eq!(body["details"], "");
        assert!(body["timestamp"].as_str().is_some_and(|t| !t.is_empty()));
    }

    #[test]
    fn test_all_kinds_are_unauthorized() {
        for err in [
            AuthError::NoCredential,
            AuthError::InvalidCredential,
            AuthError::ProcessingError,
        ] {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
        assert_eq!(AuthError::InvalidCredential.kind(), "invalid_credential");
    }
}
