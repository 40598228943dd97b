//! Development token minting.
//!
//! Real tokens come from the identity service. This signs tokens with the
//! gateway's own key so a local stack can be exercised end to end.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::verifier::KeyError;
use crate::config::validation::MIN_SECRET_BYTES;
use crate::config::JwtConfig;

/// Identity to embed in a minted token.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSpec {
    #[serde(rename = "sub")]
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<Uuid>,
    pub authorities: Vec<String>,
    pub roles: Vec<String>,
}

#[derive(Serialize)]
struct MintedClaims<'a> {
    #[serde(flatten)]
    spec: &'a TokenSpec,
    iat: i64,
    exp: i64,
}

/// Error while minting a token.
#[derive(Debug, thiserror::Error)]
pub enum MintError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Sign `spec` with the configured secret, valid for `expiration_secs`.
pub fn mint(config: &JwtConfig, spec: &TokenSpec) -> Result<String, MintError> {
    let now = chrono::Utc::now().timestamp();
    let lifetime = i64::try_from(config.expiration_secs).unwrap_or(i64::MAX);
    mint_at(config, spec, now, now.saturating_add(lifetime))
}

/// Sign `spec` with explicit issue and expiry times.
pub fn mint_at(
    config: &JwtConfig,
    spec: &TokenSpec,
    issued_at: i64,
    expires_at: i64,
) -> Result<String, MintError> {
    let encoded = config.secret.trim();
    if encoded.is_empty() {
        return Err(KeyError::Missing.into());
    }
    let secret = STANDARD.decode(encoded).map_err(KeyError::from)?;
    if secret.len() < MIN_SECRET_BYTES {
        return Err(KeyError::TooShort(secret.len()).into());
    }
    let claims = MintedClaims {
        spec,
        iat: issued_at,
        exp: expires_at,
    };

    Ok(encode(&Header::default(), &claims, &EncodingKey::from_secret(&secret))?)
}
