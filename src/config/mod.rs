//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all filters
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the signing key never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    AuthConfig, CorrelationConfig, DedupeConfig, DedupeStrategy, GatewayConfig, JwtConfig,
    KeyStrategy, ListenerConfig, LogFormat, ObservabilityConfig, RateLimitConfig, SecurityConfig,
};
