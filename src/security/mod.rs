//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (strip client identity headers, apply trusted ones)
//!     → rate_limit.rs (resolve partition key, consult limiter)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - No trust in client input: identity headers only ever come from claims
//! - Fail closed: a request the gateway cannot attribute counts as "unknown"

pub mod headers;
pub mod rate_limit;

pub use headers::{strip_trusted_headers, HeaderBuildError, TrustedHeaders};
pub use rate_limit::{KeyResolver, LocalRateLimiter, RateLimitDecision, RateLimiter};
