//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Compose the filter pipeline in a fixed, explicit order
//! - Expose the gateway's own management endpoint
//! - Bind server to listener with peer addresses recorded
//! - Stop accepting on shutdown signal
//!
//! Routing to backends is not done here: callers hand in the downstream
//! router and the pipeline wraps it.

use std::net::SocketAddr;

use axum::{
    extract::Request,
    http::HeaderName,
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer};

use crate::auth::KeyError;
use crate::config::GatewayConfig;
use crate::http::middleware::{
    authentication_middleware, dedupe_middleware, rate_limit_middleware, AuthState,
    CorrelationLayer, DedupeState, RateLimitState,
};
use crate::http::request::CorrelationId;
use crate::security::headers::trusted_header_names;

/// Path of the gateway's own health endpoint.
pub const HEALTH_PATH: &str = "/actuator/health";

/// Errors while assembling or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("signing key: {0}")]
    Key(#[from] KeyError),

    #[error("invalid correlation header name `{0}`")]
    CorrelationHeader(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wrap `downstream` in the gateway pipeline.
///
/// Outermost to innermost: correlation/logging, panic catcher, header
/// dedup, body limit, authentication, rate limit, downstream.
pub fn build_pipeline(config: &GatewayConfig, downstream: Router) -> Result<Router, ServerError> {
    let correlation_header = HeaderName::try_from(config.correlation.header_name.as_str())
        .map_err(|_| ServerError::CorrelationHeader(config.correlation.header_name.clone()))?;
    let auth_state = AuthState::from_config(config)?;

    let mut router = Router::new().route(HEALTH_PATH, get(health)).merge(downstream);

    if config.rate_limit.enabled {
        router = router.layer(middleware::from_fn_with_state(
            RateLimitState::local(&config.rate_limit),
            rate_limit_middleware,
        ));
    }

    Ok(router
        .layer(middleware::from_fn_with_state(auth_state, authentication_middleware))
        .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
        .layer(middleware::from_fn_with_state(
            DedupeState::new(&config.dedupe),
            dedupe_middleware,
        ))
        .layer(CatchPanicLayer::new())
        .layer(CorrelationLayer::new(correlation_header)))
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Build the pipeline around the echo downstream.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        Self::with_downstream(config, echo_router())
    }

    /// Build the pipeline around a caller-supplied downstream router.
    pub fn with_downstream(config: GatewayConfig, downstream: Router) -> Result<Self, ServerError> {
        let router = build_pipeline(&config, downstream)?;
        Ok(Self { router, config })
    }

    /// Run the server until the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            public_paths = ?self.config.auth.public_paths,
            rate_limit = self.config.rate_limit.enabled,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The assembled pipeline.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}

/// Downstream stand-in that reflects what a backend would receive.
pub fn echo_router() -> Router {
    Router::new().fallback(echo_handler)
}

async fn echo_handler(request: Request) -> Json<Value> {
    let correlation_id = request
        .extensions()
        .get::<CorrelationId>()
        .map(ToString::to_string);
    let identity: serde_json::Map<String, Value> = trusted_header_names()
        .into_iter()
        .filter_map(|name| {
            let value = request.headers().get(name)?.to_str().ok()?;
            Some((name.to_string(), Value::String(value.to_string())))
        })
        .collect();

    Json(json!({
        "method": request.method().as_str(),
        "path": request.uri().path(),
        "correlationId": correlation_id,
        "identity": identity,
    }))
}
