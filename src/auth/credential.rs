//! Bearer credential extraction.
//!
//! Lookup order, first match wins:
//! 1. `Authorization: Bearer <token>`
//! 2. The `access_token` cookie, read up to the next `;`

use axum::http::{header, HeaderMap};

/// Cookie carrying the access token for browser clients.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

const BEARER_PREFIX: &str = "Bearer ";

/// Where a credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    AuthorizationHeader,
    Cookie,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::AuthorizationHeader => "authorization_header",
            CredentialSource::Cookie => "cookie",
        }
    }
}

/// Find the request's credential. Empty values count as absent.
pub fn extract_credential(headers: &HeaderMap) -> Option<(&str, CredentialSource)> {
    if let Some(token) = bearer_token(headers) {
        return Some((token, CredentialSource::AuthorizationHeader));
    }

    cookie_token(headers).map(|token| (token, CredentialSource::Cookie))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ACCESS_TOKEN_COOKIE)
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
}
