//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, pipeline composition)
//!     → middleware/correlation.rs (correlation id, request span, lifecycle logs)
//!     → middleware/dedupe.rs (response header cleanup on the way out)
//!     → middleware/authentication.rs (verify credential, attach identity)
//!     → middleware/rate_limit.rs (per-key token buckets)
//!     → downstream router
//!     → response.rs (error bodies, commit marker)
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{AuthenticatedIdentity, CorrelationId, RequestStart, X_CORRELATION_ID};
pub use response::{is_committed, Committed, ErrorBody};
pub use server::{build_pipeline, echo_router, GatewayServer, ServerError};
