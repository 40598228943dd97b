//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check key material decodes and is long enough for HMAC
//! - Validate header names before they reach the pipeline
//! - Validate rate limit ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// Minimum decoded HMAC key length in bytes.
pub const MIN_SECRET_BYTES: usize = 32;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("jwt.secret is not set; provide it in the config file or GATEWAY_JWT_SECRET")]
    SecretMissing,

    #[error("jwt.secret is not valid base64")]
    SecretEncoding,

    #[error("jwt.secret decodes to {0} bytes, at least {MIN_SECRET_BYTES} required")]
    SecretTooShort(usize),

    #[error("jwt.expiration_secs must be greater than zero")]
    ZeroLifetime,

    #[error("auth.public_paths entry `{0}` must start with `/`")]
    PublicPath(String),

    #[error("correlation.header_name `{0}` is not a valid header name")]
    CorrelationHeader(String),

    #[error("dedupe.names entry `{0}` is not a valid header name")]
    DedupeHeader(String),

    #[error("rate_limit.replenish_rate must be greater than zero")]
    ZeroReplenishRate,

    #[error("rate_limit.burst_capacity ({burst}) is smaller than rate_limit.requested_tokens ({requested})")]
    BurstBelowRequested { burst: u32, requested: u32 },

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let secret = config.jwt.secret.trim();
    if secret.is_empty() {
        errors.push(ValidationError::SecretMissing);
    } else {
        match STANDARD.decode(secret) {
            Ok(bytes) if bytes.len() < MIN_SECRET_BYTES => {
                errors.push(ValidationError::SecretTooShort(bytes.len()));
            }
            Ok(_) => {}
            Err(_) => errors.push(ValidationError::SecretEncoding),
        }
    }

    if config.jwt.expiration_secs == 0 {
        errors.push(ValidationError::ZeroLifetime);
    }

    for path in &config.auth.public_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::PublicPath(path.clone()));
        }
    }

    if HeaderName::try_from(config.correlation.header_name.as_str()).is_err() {
        errors.push(ValidationError::CorrelationHeader(config.correlation.header_name.clone()));
    }

    for name in &config.dedupe.names {
        if HeaderName::try_from(name.as_str()).is_err() {
            errors.push(ValidationError::DedupeHeader(name.clone()));
        }
    }

    if config.rate_limit.enabled {
        if config.rate_limit.replenish_rate == 0 {
            errors.push(ValidationError::ZeroReplenishRate);
        }
        if config.rate_limit.burst_capacity < config.rate_limit.requested_tokens {
            errors.push(ValidationError::BurstBelowRequested {
                burst: config.rate_limit.burst_capacity,
                requested: config.rate_limit.requested_tokens,
            });
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(config.observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
