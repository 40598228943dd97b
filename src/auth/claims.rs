//! Per-field claim extraction.
//!
//! Each claim is read independently from the decoded payload. A missing or
//! malformed optional claim only makes that field absent; the token itself
//! stays valid.

use serde_json::{Map, Value};
use uuid::Uuid;

pub const SUBJECT: &str = "sub";
pub const EXPIRY: &str = "exp";
pub const USER_ID: &str = "userId";
pub const ORGANIZATION_ID: &str = "organizationId";
pub const DEPARTMENT_ID: &str = "departmentId";
pub const TEAM_ID: &str = "teamId";
pub const AUTHORITIES: &str = "authorities";
pub const ROLES: &str = "roles";

/// Claims of a verified credential.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenClaims {
    /// Subject (username).
    pub subject: Option<String>,
    pub user_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub authorities: Vec<String>,
    pub roles: Vec<String>,
    /// Expiry as seconds since the Unix epoch.
    pub expires_at: i64,
}

impl TokenClaims {
    /// Build claims from a decoded payload whose expiry was already checked.
    pub fn from_payload(payload: &Map<String, Value>, expires_at: i64) -> Self {
        Self {
            subject: string_claim(payload, SUBJECT),
            user_id: uuid_claim(payload, USER_ID),
            organization_id: uuid_claim(payload, ORGANIZATION_ID),
            department_id: uuid_claim(payload, DEPARTMENT_ID),
            team_id: uuid_claim(payload, TEAM_ID),
            authorities: string_list_claim(payload, AUTHORITIES),
            roles: string_list_claim(payload, ROLES),
            expires_at,
        }
    }
}

/// Read the `exp` claim as whole seconds.
pub fn expiry_claim(payload: &Map<String, Value>) -> Option<i64> {
    let value = payload.get(EXPIRY)?;
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}

fn string_claim(payload: &Map<String, Value>, name: &str) -> Option<String> {
    payload
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn uuid_claim(payload: &Map<String, Value>, name: &str) -> Option<Uuid> {
    let raw = payload.get(name)?.as_str()?;
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::debug!(claim = name, error = %e, "Ignoring malformed identifier claim");
            None
        }
    }
}

/// A list claim with any non-string element is treated as absent.
fn string_list_claim(payload: &Map<String, Value>, name: &str) -> Vec<String> {
    let Some(items) = payload.get(name).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| item.as_str().map(str::to_owned))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("payload must be an object"),
        }
    }

    #[test]
    fn test_all_claims_present() {
        let user = Uuid::new_v4();
        let org = Uuid::new_v4();
        let claims = TokenClaims::from_payload(
            &payload(json!({
                "sub": "alice",
                "userId": user.to_string(),
                "organizationId": org.to_string(),
                "authorities": ["survey:read", "survey:write"],
                "roles": ["ADMIN"],
            })),
            42,
        );

        assert_eq!(claims.subject.as_deref(), Some("alice"));
        assert_eq!(claims.user_id, Some(user));
        assert_eq!(claims.organization_id, Some(org));
        assert_eq!(claims.department_id, None);
        assert_eq!(claims.team_id, None);
        assert_eq!(claims.authorities, vec!["survey:read", "survey:write"]);
        assert_eq!(claims.roles, vec!["ADMIN"]);
        assert_eq!(claims.expires_at, 42);
    }

    #[test]
    fn test_malformed_claim_only_affects_its_field() {
        let team = Uuid::new_v4();
        let claims = TokenClaims::from_payload(
            &payload(json!({
                "sub": "bob",
                "userId": "not-a-uuid",
                "departmentId": 17,
                "teamId": team.to_string(),
                "authorities": "survey:read",
                "roles": ["USER", 3],
            })),
            0,
        );

        assert_eq!(claims.subject.as_deref(), Some("bob"));
        assert_eq!(claims.user_id, None);
        assert_eq!(claims.department_id, None);
        assert_eq!(claims.team_id, Some(team));
        assert!(claims.authorities.is_empty());
        assert!(claims.roles.is_empty());
    }

    #[test]
    fn test_expiry_claim_accepts_float_seconds() {
        assert_eq!(expiry_claim(&payload(json!({"exp": 1700000000}))), Some(1_700_000_000));
        assert_eq!(expiry_claim(&payload(json!({"exp": 1700000000.9}))), Some(1_700_000_000));
        assert_eq!(expiry_claim(&payload(json!({"exp": "soon"}))), None);
        assert_eq!(expiry_claim(&payload(json!({}))), None);
    }
}
