//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the authentication gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Token signing key material and lifetime.
    pub jwt: JwtConfig,

    /// Authentication filter settings.
    pub auth: AuthConfig,

    /// Correlation id propagation.
    pub correlation: CorrelationConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Response header deduplication.
    pub dedupe: DedupeConfig,

    /// Request size limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Token verification key material.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Base64-encoded HMAC secret shared with the token issuer. Empty by
    /// default; the file or `GATEWAY_JWT_SECRET` must supply it.
    pub secret: String,

    /// Token lifetime in seconds, used when minting development tokens.
    pub expiration_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            expiration_secs: 86_400,
        }
    }
}

/// Authentication filter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Path prefixes that bypass authentication entirely.
    pub public_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            public_paths: vec![
                "/api/auth/login".to_string(),
                "/api/auth/register".to_string(),
                "/api/auth/refresh".to_string(),
                "/api/organizations/register".to_string(),
                "/actuator/".to_string(),
            ],
        }
    }
}

/// Correlation id configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Header carrying the correlation id in both directions.
    pub header_name: String,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            header_name: "X-Correlation-ID".to_string(),
        }
    }
}

/// Which value a request's rate-limit bucket is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    /// Authenticated user id, falling back to the client address.
    #[default]
    #[serde(alias = "user")]
    Identity,
    /// Client address only.
    #[serde(alias = "ip")]
    Address,
}

impl KeyStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStrategy::Identity => "identity",
            KeyStrategy::Address => "address",
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Key resolution strategy.
    pub strategy: KeyStrategy,

    /// Tokens added to each bucket per second.
    pub replenish_rate: u32,

    /// Maximum tokens a bucket can hold.
    pub burst_capacity: u32,

    /// Tokens consumed by each request.
    pub requested_tokens: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            strategy: KeyStrategy::Identity,
            replenish_rate: 10,
            burst_capacity: 20,
            requested_tokens: 1,
        }
    }
}

/// Which of several duplicate header values survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum DedupeStrategy {
    #[default]
    #[serde(rename = "keep-first", alias = "RETAIN_FIRST")]
    KeepFirst,
    #[serde(rename = "keep-last", alias = "RETAIN_LAST")]
    KeepLast,
}

/// Response header deduplication configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DedupeConfig {
    /// Response headers to collapse to a single value.
    pub names: Vec<String>,

    /// Value retention strategy.
    pub strategy: DedupeStrategy,
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
