//! Per-request context carried in request extensions.
//!
//! # Responsibilities
//! - Correlation id type shared by the logging filter and handlers
//! - Verified identity for in-process handlers
//!
//! # Design Decisions
//! - Context travels explicitly with the request, never in globals
//! - Correlation ids are accepted from clients only when usable as headers

use std::sync::Arc;
use std::time::Instant;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

use crate::auth::TokenClaims;

/// Default header carrying the correlation id.
pub static X_CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

/// Identifier threading one request's log records together.
///
/// Holds the text and its header form side by side, so the id that is
/// logged is always the id that is forwarded and echoed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CorrelationId {
    id: Arc<str>,
    header: HeaderValue,
}

impl CorrelationId {
    /// Accept `id` if it is non-empty after trimming and usable as a header value.
    pub fn parse(id: &str) -> Option<Self> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        let header = HeaderValue::from_str(id).ok()?;
        Some(Self {
            id: Arc::from(id),
            header,
        })
    }

    /// Generates a new random correlation ID using UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        // A hyphenated UUID is always a valid header value.
        loop {
            if let Some(id) = Self::parse(&Uuid::new_v4().to_string()) {
                return id;
            }
        }
    }

    /// Take the inbound id if present and usable, otherwise generate one.
    pub fn from_headers(headers: &HeaderMap, name: &HeaderName) -> Self {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse)
            .unwrap_or_else(Self::generate)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Header form of the id.
    pub fn header_value(&self) -> HeaderValue {
        self.header.clone()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// When the gateway started handling the request.
#[derive(Clone, Copy, Debug)]
pub struct RequestStart(pub Instant);

/// Claims of the authenticated caller, set by the authentication filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedIdentity(pub Arc<TokenClaims>);
