//! Authentication and request-context gateway.
//!
//! Sits in front of backend services: verifies signed bearer credentials,
//! asserts the caller's identity to backends through trusted headers,
//! correlates and logs every request, and tidies response headers.

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use http::{build_pipeline, GatewayServer};
pub use lifecycle::Shutdown;
