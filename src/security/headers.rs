//! Trusted identity headers.
//!
//! # Responsibilities
//! - Strip every identity header a client may have sent
//! - Derive identity headers from verified claims only
//! - Apply them to the request forwarded downstream
//!
//! # Design Decisions
//! - Never trust identity headers from the inbound request
//! - Headers are inserted, not appended, so re-running the filter on an
//!   enriched request produces identical values
//! - A claim that cannot be encoded as a header value fails the whole
//!   derivation rather than silently dropping identity

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

use crate::auth::TokenClaims;

pub static X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
pub static X_USERNAME: HeaderName = HeaderName::from_static("x-username");
pub static X_USER_NAME: HeaderName = HeaderName::from_static("x-user-name");
pub static X_ORGANIZATION_ID: HeaderName = HeaderName::from_static("x-organization-id");
pub static X_DEPARTMENT_ID: HeaderName = HeaderName::from_static("x-department-id");
pub static X_TEAM_ID: HeaderName = HeaderName::from_static("x-team-id");
pub static X_AUTHORITIES: HeaderName = HeaderName::from_static("x-authorities");
pub static X_USER_AUTHORITIES: HeaderName = HeaderName::from_static("x-user-authorities");
pub static X_ROLES: HeaderName = HeaderName::from_static("x-roles");
pub static X_USER_ROLES: HeaderName = HeaderName::from_static("x-user-roles");
pub static X_AUTHENTICATED: HeaderName = HeaderName::from_static("x-authenticated");

/// Every header name the gateway asserts to backends.
pub fn trusted_header_names() -> [&'static HeaderName; 11] {
    [
        &X_USER_ID,
        &X_USERNAME,
        &X_USER_NAME,
        &X_ORGANIZATION_ID,
        &X_DEPARTMENT_ID,
        &X_TEAM_ID,
        &X_AUTHORITIES,
        &X_USER_AUTHORITIES,
        &X_ROLES,
        &X_USER_ROLES,
        &X_AUTHENTICATED,
    ]
}

/// Remove all trusted identity headers. Returns how many values were dropped.
pub fn strip_trusted_headers(headers: &mut HeaderMap) -> usize {
    trusted_header_names()
        .into_iter()
        .map(|name| match headers.entry(name) {
            axum::http::header::Entry::Occupied(entry) => entry.remove_entry_mult().1.count(),
            axum::http::header::Entry::Vacant(_) => 0,
        })
        .sum()
}

/// A claim value could not be carried in a header.
#[derive(Debug, Error)]
#[error("claim `{claim}` cannot be encoded as a header value")]
pub struct HeaderBuildError {
    pub claim: &'static str,
}

/// Identity headers derived from one set of verified claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedHeaders {
    entries: Vec<(&'static HeaderName, HeaderValue)>,
}

impl TrustedHeaders {
    /// Derive headers for every non-empty claim plus the authenticated marker.
    pub fn from_claims(claims: &TokenClaims) -> Result<Self, HeaderBuildError> {
        let mut entries = Vec::with_capacity(11);

        if let Some(user_id) = claims.user_id {
            entries.push((&X_USER_ID, encode("userId", &user_id.to_string())?));
        }
        if let Some(subject) = &claims.subject {
            let value = encode("sub", subject)?;
            entries.push((&X_USERNAME, value.clone()));
            entries.push((&X_USER_NAME, value));
        }
        if let Some(org) = claims.organization_id {
            entries.push((&X_ORGANIZATION_ID, encode("organizationId", &org.to_string())?));
        }
        if let Some(department) = claims.department_id {
            entries.push((&X_DEPARTMENT_ID, encode("departmentId", &department.to_string())?));
        }
        if let Some(team) = claims.team_id {
            entries.push((&X_TEAM_ID, encode("teamId", &team.to_string())?));
        }
        if !claims.authorities.is_empty() {
            let value = encode("authorities", &claims.authorities.join(","))?;
            entries.push((&X_AUTHORITIES, value.clone()));
            entries.push((&X_USER_AUTHORITIES, value));
        }
        if !claims.roles.is_empty() {
            let value = encode("roles", &claims.roles.join(","))?;
            entries.push((&X_ROLES, value.clone()));
            entries.push((&X_USER_ROLES, value));
        }
        entries.push((&X_AUTHENTICATED, HeaderValue::from_static("true")));

        Ok(Self { entries })
    }

    /// Write the headers, replacing any existing values under the same names.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.entries {
            headers.insert((*name).clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

fn encode(claim: &'static str, value: &str) -> Result<HeaderValue, HeaderBuildError> {
    HeaderValue::from_str(value).map_err(|_| HeaderBuildError { claim })
}
