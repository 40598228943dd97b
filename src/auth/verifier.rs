//! Credential verification.
//!
//! # Responsibilities
//! - Check the HMAC signature against the configured key
//! - Reject tokens whose expiry is at or before the current time
//! - Expose claims, each field extracted independently
//!
//! # Design Decisions
//! - Stateless: the decoding key is read once at construction and never mutated,
//!   so one verifier is shared by every in-flight request without locking
//! - Expiry is checked here rather than by the JWT library so the boundary
//!   (`exp == now` is expired) and the clock are explicit

use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::auth::claims::{expiry_claim, TokenClaims};
use crate::config::validation::MIN_SECRET_BYTES;
use crate::config::JwtConfig;

/// Why a credential was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("token structure could not be parsed")]
    Malformed,

    #[error("token signature does not match the signing key")]
    BadSignature,

    #[error("token algorithm is not accepted")]
    UnsupportedAlgorithm,

    #[error("token carries no expiry")]
    MissingExpiry,

    #[error("token expired at {expired_at}")]
    Expired { expired_at: i64 },
}

/// Outcome of a single verification.
pub type VerificationResult = Result<TokenClaims, VerifyError>;

/// Signing key material could not be loaded.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("no signing secret configured")]
    Missing,

    #[error("signing secret is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("signing secret is {0} bytes, at least {MIN_SECRET_BYTES} required")]
    TooShort(usize),
}

/// Verifies signed bearer credentials.
#[derive(Clone)]
pub struct CredentialVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl CredentialVerifier {
    /// Build a verifier from the base64-encoded secret in the config.
    pub fn from_config(config: &JwtConfig) -> Result<Self, KeyError> {
        let encoded = config.secret.trim();
        if encoded.is_empty() {
            return Err(KeyError::Missing);
        }
        let secret = STANDARD.decode(encoded)?;
        Self::from_secret(&secret)
    }

    /// Build a verifier from raw key bytes.
    pub fn from_secret(secret: &[u8]) -> Result<Self, KeyError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(KeyError::TooShort(secret.len()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> VerificationResult {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify a token against `now` (seconds since the Unix epoch).
    pub fn verify_at(&self, token: &str, now: i64) -> VerificationResult {
        let data = decode::<Map<String, Value>>(token, &self.key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => VerifyError::BadSignature,
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                    VerifyError::UnsupportedAlgorithm
                }
                _ => VerifyError::Malformed,
            },
        )?;

        let expires_at = expiry_claim(&data.claims).ok_or(VerifyError::MissingExpiry)?;
        if expires_at <= now {
            return Err(VerifyError::Expired { expired_at: expires_at });
        }

        Ok(TokenClaims::from_payload(&data.claims, expires_at))
    }
}
