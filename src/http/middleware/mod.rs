//! Request pipeline filters, outermost first.
//!
//! ```text
//! correlation.rs    → correlation id, timing, start/end/error records
//! dedupe.rs         → collapse duplicate response headers (return path)
//! authentication.rs → public paths, credential verification, identity headers
//! rate_limit.rs     → partition key resolution, token buckets
//! ```

pub mod authentication;
pub mod correlation;
pub mod dedupe;
pub mod rate_limit;

pub use authentication::{authentication_middleware, AuthState};
pub use correlation::{CorrelationLayer, CorrelationService};
pub use dedupe::{dedupe_headers, dedupe_middleware, DedupeOutcome, DedupeState};
pub use rate_limit::{rate_limit_middleware, RateLimitState};
