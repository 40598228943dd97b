//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All filters produce:
//!     → logging.rs (structured log events inside the request span)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Correlation id flows through every record via the request span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
