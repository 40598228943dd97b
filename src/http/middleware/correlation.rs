//! Correlation id and request logging.
//!
//! # Responsibilities
//! - Accept or generate a correlation id for every request
//! - Forward it downstream and echo it on every response
//! - Emit start, completion and error records with timing
//!
//! # Design Decisions
//! - The request span is the logging context; it is entered only while the
//!   request future is polled, so concurrent requests never share it and
//!   nothing needs clearing afterwards
//! - A completion guard logs cancelled requests when the future is dropped
//! - Header names are logged, values never are

use std::fmt::Display;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, HeaderName, Method, Request, Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};
use tracing::Instrument;

use crate::http::request::{CorrelationId, RequestStart, X_CORRELATION_ID};
use crate::observability::metrics;

/// Layer that applies [`CorrelationService`].
#[derive(Debug, Clone)]
pub struct CorrelationLayer {
    header: HeaderName,
}

impl CorrelationLayer {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl Default for CorrelationLayer {
    fn default() -> Self {
        Self::new(X_CORRELATION_ID.clone())
    }
}

impl<S> Layer<S> for CorrelationLayer {
    type Service = CorrelationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationService {
            inner,
            header: self.header.clone(),
        }
    }
}

/// Assigns correlation ids and logs each request's lifecycle.
#[derive(Debug, Clone)]
pub struct CorrelationService<S> {
    inner: S,
    header: HeaderName,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorrelationService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Display + Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        // Take the service that was driven to readiness, leave a clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let header = self.header.clone();

        let correlation_id = CorrelationId::from_headers(request.headers(), &header);
        let header_value = correlation_id.header_value();
        request.headers_mut().insert(header.clone(), header_value.clone());

        let started = Instant::now();
        request.extensions_mut().insert(correlation_id.clone());
        request.extensions_mut().insert(RequestStart(started));

        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let span = tracing::info_span!(
            "request",
            correlation_id = %correlation_id,
            method = %method,
            path = %path,
        );

        let mut log = RequestLog::new(correlation_id, method, path, started);
        span.in_scope(|| log.started(request.headers()));

        Box::pin(
            async move {
                match inner.call(request).await {
                    Ok(mut response) => {
                        response.headers_mut().insert(header, header_value);
                        log.completed(response.status().as_u16());
                        Ok(response)
                    }
                    Err(err) => {
                        log.failed(&err);
                        Err(err)
                    }
                }
            }
            .instrument(span),
        )
    }
}

/// Lifecycle records for one request. Logs a cancellation if dropped
/// before the request completed or failed.
struct RequestLog {
    correlation_id: CorrelationId,
    method: Method,
    path: String,
    started: Instant,
    finished: bool,
}

impl RequestLog {
    fn new(correlation_id: CorrelationId, method: Method, path: String, started: Instant) -> Self {
        Self {
            correlation_id,
            method,
            path,
            started,
            finished: false,
        }
    }

    fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.started)
    }

    fn started(&self, headers: &HeaderMap) {
        tracing::info!(
            method = %self.method,
            path = %self.path,
            headers = ?header_names(headers),
            "Gateway request"
        );
    }

    fn completed(&mut self, status: u16) {
        self.finished = true;
        let elapsed = self.elapsed();
        metrics::record_request(self.method.as_str(), status, elapsed);
        tracing::info!(
            status,
            duration_ms = elapsed.as_millis() as u64,
            correlation_id = %self.correlation_id,
            "Gateway response"
        );
    }

    fn failed(&mut self, err: &dyn Display) {
        self.finished = true;
        tracing::error!(
            method = %self.method,
            path = %self.path,
            correlation_id = %self.correlation_id,
            error = %err,
            "Gateway error"
        );
    }
}

impl Drop for RequestLog {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                method = %self.method,
                path = %self.path,
                duration_ms = self.elapsed().as_millis() as u64,
                correlation_id = %self.correlation_id,
                "Gateway request cancelled"
            );
        }
    }
}

/// Distinct header names.
fn header_names(headers: &HeaderMap) -> Vec<&str> {
    headers.keys().map(HeaderName::as_str).collect()
}
