//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that overrides `jwt.secret`.
pub const SECRET_ENV_VAR: &str = "GATEWAY_JWT_SECRET";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, std::env::var(SECRET_ENV_VAR).ok())
}

/// Load the file if it exists, otherwise start from defaults.
///
/// The environment override and validation apply in both cases. Defaults
/// carry no signing secret, so without a file `GATEWAY_JWT_SECRET` is required.
pub fn load_or_default(path: &Path) -> Result<GatewayConfig, ConfigError> {
    load_or_default_with(path, std::env::var(SECRET_ENV_VAR).ok())
}

fn load_or_default_with(
    path: &Path,
    secret_override: Option<String>,
) -> Result<GatewayConfig, ConfigError> {
    if path.exists() {
        let content = fs::read_to_string(path)?;
        return parse_config(&content, secret_override);
    }

    tracing::warn!(path = %path.display(), "Config file not found, using defaults");
    let mut config = GatewayConfig::default();
    apply_secret_override(&mut config, secret_override);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse TOML content, apply the secret override and validate.
pub fn parse_config(
    content: &str,
    secret_override: Option<String>,
) -> Result<GatewayConfig, ConfigError> {
    let mut config: GatewayConfig = toml::from_str(content)?;
    apply_secret_override(&mut config, secret_override);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn apply_secret_override(config: &mut GatewayConfig, secret_override: Option<String>) {
    if let Some(secret) = secret_override.filter(|s| !s.trim().is_empty()) {
        config.jwt.secret = secret;
    }
}
