//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → public_paths.rs (exempt prefix? pass through)
//!     → credential.rs (Authorization bearer, then access_token cookie)
//!     → verifier.rs (signature + expiry, per-field claims)
//!     → security::headers (derive trusted identity headers)
//!     → error.rs (uniform 401 on any failure)
//! ```
//!
//! # Design Decisions
//! - A single verification attempt per request, nothing cached
//! - Internal failure detail is logged, never returned to the client

pub mod claims;
pub mod credential;
pub mod error;
pub mod public_paths;
pub mod token;
pub mod verifier;

pub use claims::TokenClaims;
pub use credential::{extract_credential, CredentialSource};
pub use error::AuthError;
pub use public_paths::PublicPaths;
pub use verifier::{CredentialVerifier, KeyError, VerificationResult, VerifyError};
