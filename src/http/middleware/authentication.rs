//! Authentication Middleware.
//! Verifies bearer credentials and asserts the caller's identity to backends.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{extract_credential, AuthError, CredentialVerifier, PublicPaths};
use crate::config::GatewayConfig;
use crate::http::request::AuthenticatedIdentity;
use crate::security::headers::{strip_trusted_headers, TrustedHeaders};

/// State required for authentication.
#[derive(Clone, Debug)]
pub struct AuthState {
    pub verifier: Arc<CredentialVerifier>,
    pub public_paths: Arc<PublicPaths>,
}

impl AuthState {
    pub fn new(verifier: CredentialVerifier, public_paths: PublicPaths) -> Self {
        Self {
            verifier: Arc::new(verifier),
            public_paths: Arc::new(public_paths),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, crate::auth::KeyError> {
        Ok(Self::new(
            CredentialVerifier::from_config(&config.jwt)?,
            PublicPaths::new(config.auth.public_paths.iter().cloned()),
        ))
    }
}

pub async fn authentication_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    tracing::debug!(path = %path, "Processing request");

    // 1. Identity headers only ever come from verified claims.
    let spoofed = strip_trusted_headers(req.headers_mut());
    if spoofed > 0 {
        tracing::warn!(path = %path, count = spoofed, "Discarded client-supplied identity headers");
    }

    // 2. Public paths pass through unauthenticated.
    if state.public_paths.is_public(&path) {
        tracing::debug!(path = %path, "Skipping authentication for public endpoint");
        return next.run(req).await;
    }

    // 3. Extract and verify the credential
    let Some((token, source)) = extract_credential(req.headers()) else {
        tracing::warn!(path = %path, "No token found in request");
        return AuthError::NoCredential.into_response();
    };

    let claims = match state.verifier.verify(token) {
        Ok(claims) => claims,
        Err(reason) => {
            tracing::warn!(path = %path, source = source.as_str(), reason = %reason, "Invalid token for request");
            return AuthError::InvalidCredential.into_response();
        }
    };

    // 4. Attach trusted identity
    let headers = match TrustedHeaders::from_claims(&claims) {
        Ok(headers) => headers,
        Err(e) => {
            tracing::error!(path = %path, error = %e, "Error processing token for request");
            return AuthError::ProcessingError.into_response();
        }
    };

    tracing::debug!(
        subject = claims.subject.as_deref().unwrap_or("-"),
        organization_id = ?claims.organization_id,
        "Token validated"
    );

    headers.apply(req.headers_mut());
    req.extensions_mut().insert(AuthenticatedIdentity(Arc::new(claims)));
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        middleware, Json, Router,
    };
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn token(claims: Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn future_exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    /// Echoes the headers the backend would see.
    async fn backend(headers: HeaderMap) -> Json<Value> {
        let map: serde_json::Map<String, Value> = headers
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v.to_str().unwrap_or_default())))
            .collect();
        Json(Value::Object(map))
    }

    fn app() -> Router {
        let state = AuthState::new(
            CredentialVerifier::from_secret(SECRET).unwrap(),
            PublicPaths::new(["/api/auth/login", "/actuator/"]),
        );
        Router::new()
            .fallback(backend)
            .layer(middleware::from_fn_with_state(state, authentication_middleware))
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_public_path_needs_no_credential() {
        let (status, seen) = send(
            Request::builder()
                .uri("/api/auth/login")
                .header("X-Authenticated", "true")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(seen.get("x-authenticated").is_none());
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let (status, body) =
            send(Request::builder().uri("/api/surveys").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "No authentication token found");
    }

    #[tokio::test]
    async fn test_valid_bearer_token() {
        let org = uuid::Uuid::new_v4();
        let token = token(json!({
            "sub": "alice",
            "exp": future_exp(),
            "organizationId": org.to_string(),
            "roles": ["ADMIN"],
        }));

        let (status, seen) = send(
            Request::builder()
                .uri("/api/surveys")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(seen["x-authenticated"], "true");
        assert_eq!(seen["x-username"], "alice");
        assert_eq!(seen["x-organization-id"], org.to_string());
        assert_eq!(seen["x-roles"], "ADMIN");
        assert!(seen.get("x-user-id").is_none());
        assert!(seen.get("x-authorities").is_none());
    }

    #[tokio::test]
    async fn test_cookie_token() {
        let token = token(json!({"sub": "carol", "exp": future_exp()}));
        let (status, seen) = send(
            Request::builder()
                .uri("/api/surveys")
                .header("Cookie", format!("theme=dark; access_token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(seen["x-user-name"], "carol");
    }

    #[tokio::test]
    async fn test_expired_token() {
        let token = token(json!({"sub": "alice", "exp": 1_000}));
        let (status, body) = send(
            Request::builder()
                .uri("/api/surveys")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid authentication token");
    }

    #[tokio::test]
    async fn test_unencodable_subject_is_processing_error() {
        let token = token(json!({"sub": "evil\r\nX-Admin: true", "exp": future_exp()}));
        let (status, body) = send(
            Request::builder()
                .uri("/api/surveys")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Token processing error");
        assert!(!body.to_string().contains("sub"));
    }

    #[tokio::test]
    async fn test_spoofed_identity_is_replaced() {
        let token = token(json!({"sub": "alice", "exp": future_exp()}));
        let (status, seen) = send(
            Request::builder()
                .uri("/api/surveys")
                .header("Authorization", format!("Bearer {token}"))
                .header("X-Username", "mallory")
                .header("X-Roles", "SUPERADMIN")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(seen["x-username"], "alice");
        assert!(seen.get("x-roles").is_none());
    }
}
