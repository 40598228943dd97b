//! Response header deduplication.
//!
//! # Responsibilities
//! - Collapse repeated values of configured response headers to one
//!
//! # Design Decisions
//! - Best effort: only successful, uncommitted responses are touched
//! - Every problem becomes a `DedupeOutcome` that is logged, never an error

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, Request},
    middleware::Next,
    response::Response,
};

use crate::config::{DedupeConfig, DedupeStrategy};
use crate::http::response::is_committed;
use crate::observability::metrics;

/// State required for header deduplication.
#[derive(Clone, Debug)]
pub struct DedupeState {
    names: Arc<[String]>,
    strategy: DedupeStrategy,
}

impl DedupeState {
    pub fn new(config: &DedupeConfig) -> Self {
        Self {
            names: config.names.iter().cloned().collect(),
            strategy: config.strategy,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// What happened to one configured header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupeOutcome {
    /// Repeated values were collapsed; `removed` values were dropped.
    Collapsed { name: String, removed: usize },
    /// Absent or already single-valued.
    Unchanged { name: String },
    /// The step could not run for this header.
    Skipped { name: String, reason: SkipReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InvalidHeaderName,
}

/// Collapse each named header to a single value.
pub fn dedupe_headers(
    headers: &mut HeaderMap,
    names: &[String],
    strategy: DedupeStrategy,
) -> Vec<DedupeOutcome> {
    names
        .iter()
        .map(|raw| {
            let Ok(name) = HeaderName::try_from(raw.as_str()) else {
                return DedupeOutcome::Skipped {
                    name: raw.clone(),
                    reason: SkipReason::InvalidHeaderName,
                };
            };

            let mut values = headers.get_all(&name).iter();
            let total = headers.get_all(&name).iter().count();
            if total < 2 {
                return DedupeOutcome::Unchanged { name: raw.clone() };
            }

            let keep = match strategy {
                DedupeStrategy::KeepFirst => values.next(),
                DedupeStrategy::KeepLast => values.last(),
            }
            .cloned();

            if let Some(value) = keep {
                headers.insert(name, value);
            }

            DedupeOutcome::Collapsed {
                name: raw.clone(),
                removed: total - 1,
            }
        })
        .collect()
}

pub async fn dedupe_middleware(
    State(state): State<DedupeState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    let mut response = next.run(req).await;

    if state.is_empty() {
        return response;
    }

    if is_committed(&response) || !response.status().is_success() {
        tracing::debug!(
            path = %path,
            committed = is_committed(&response),
            status = %response.status(),
            "Skipping header deduplication"
        );
        return response;
    }

    for outcome in dedupe_headers(response.headers_mut(), &state.names, state.strategy) {
        match outcome {
            DedupeOutcome::Collapsed { name, removed } => {
                tracing::debug!(path = %path, header = %name, removed, "Headers deduplicated");
            }
            DedupeOutcome::Unchanged { .. } => {}
            DedupeOutcome::Skipped { name, reason } => {
                metrics::record_dedup_skipped();
                tracing::debug!(path = %path, header = %name, reason = ?reason, "Could not dedupe header");
            }
        }
    }

    response
}
