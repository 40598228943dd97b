//! Rate limiting middleware.
//! Resolves the partition key and asks the limiter for tokens.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::RateLimitConfig;
use crate::http::response::ErrorBody;
use crate::observability::metrics;
use crate::security::rate_limit::{KeyResolver, LocalRateLimiter, RateLimiter};

pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub static X_RATELIMIT_REPLENISH_RATE: HeaderName =
    HeaderName::from_static("x-ratelimit-replenish-rate");
pub static X_RATELIMIT_BURST_CAPACITY: HeaderName =
    HeaderName::from_static("x-ratelimit-burst-capacity");
pub static X_RATELIMIT_REQUESTED_TOKENS: HeaderName =
    HeaderName::from_static("x-ratelimit-requested-tokens");

/// State for the rate limiter.
#[derive(Clone)]
pub struct RateLimitState {
    pub resolver: KeyResolver,
    pub limiter: Arc<dyn RateLimiter>,
    pub config: RateLimitConfig,
}

impl RateLimitState {
    /// Local token buckets keyed per the configured strategy.
    pub fn local(config: &RateLimitConfig) -> Self {
        Self::with_limiter(config, Arc::new(LocalRateLimiter::new(config)))
    }

    pub fn with_limiter(config: &RateLimitConfig, limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            resolver: KeyResolver::new(config.strategy),
            limiter,
            config: config.clone(),
        }
    }

    fn quota_headers(&self, headers: &mut HeaderMap) {
        headers.insert(
            X_RATELIMIT_REPLENISH_RATE.clone(),
            HeaderValue::from(self.config.replenish_rate),
        );
        headers.insert(
            X_RATELIMIT_BURST_CAPACITY.clone(),
            HeaderValue::from(self.config.burst_capacity),
        );
        headers.insert(
            X_RATELIMIT_REQUESTED_TOKENS.clone(),
            HeaderValue::from(self.config.requested_tokens),
        );
    }
}

pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = state.resolver.resolve(&request);
    let decision = state.limiter.try_acquire(&key);

    if !decision.allowed {
        let strategy = state.resolver.strategy().as_str();
        tracing::warn!(key = %key, strategy, "Rate limit exceeded");
        metrics::record_rate_limited(strategy);

        let mut response =
            ErrorBody::new(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response();
        response
            .headers_mut()
            .insert(X_RATELIMIT_REMAINING.clone(), HeaderValue::from(decision.remaining));
        state.quota_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(X_RATELIMIT_REMAINING.clone(), HeaderValue::from(decision.remaining));
    response
}
