//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use auth_gateway::config::GatewayConfig;
use axum::body::Body;
use axum::http::Response;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{Map, Value};
use tracing::span::{Attributes, Id};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

/// Signing key shared by the gateway under test and the token builders.
pub const SECRET: &[u8] = b"integration-test-secret-0123456789";

pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.jwt.secret = STANDARD.encode(SECRET);
    config
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Sign `claims` with [`SECRET`].
pub fn sign(claims: &Value) -> String {
    sign_with(claims, SECRET)
}

pub fn sign_with(claims: &Value, secret: &[u8]) -> String {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret)).unwrap()
}

/// A fully populated identity that expires in an hour.
pub fn full_claims() -> Value {
    serde_json::json!({
        "sub": "alice",
        "userId": "5f1c1c1e-8d38-4c7a-9c55-0d9f1b8e6a01",
        "organizationId": "0b7e2d4a-52a6-4e0e-8d9b-7a1c3f2e9d10",
        "departmentId": "9a3b6c1d-2e4f-4a5b-8c7d-1e2f3a4b5c6d",
        "teamId": "c4d5e6f7-a8b9-4c0d-9e1f-2a3b4c5d6e7f",
        "authorities": ["survey:read", "survey:write"],
        "roles": ["ADMIN", "ANALYST"],
        "exp": now() + 3600,
    })
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Bind an ephemeral port.
pub async fn ephemeral_listener() -> (tokio::net::TcpListener, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// One captured log record.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub fields: Map<String, Value>,
    /// `correlation_id` of the innermost enclosing span that has one.
    pub span_correlation_id: Option<String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// The correlation id this record belongs to, from its span or its own fields.
    pub fn correlation_id(&self) -> Option<&str> {
        self.span_correlation_id
            .as_deref()
            .or_else(|| self.field("correlation_id"))
    }
}

/// Tracing layer that keeps every event in memory.
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.message == message)
            .collect()
    }
}

struct SpanFields(Map<String, Value>);

#[derive(Default)]
struct FieldVisitor {
    fields: Map<String, Value>,
    message: Option<String>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let value = format!("{value:?}");
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.insert(field.name().to_string(), Value::String(value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::Bool(value));
    }
}

impl<S> Layer<S> for LogCapture
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(visitor.fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let span_correlation_id = ctx.event_scope(event).and_then(|scope| {
            scope.into_iter().find_map(|span| {
                span.extensions()
                    .get::<SpanFields>()
                    .and_then(|f| f.0.get("correlation_id"))
                    .and_then(Value::as_str)
                    .map(String::from)
            })
        });

        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
            span_correlation_id,
        });
    }
}

/// Install a capturing subscriber for the current thread.
///
/// Tests using this must run on the current-thread runtime.
pub fn capture_logs() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    use tracing_subscriber::prelude::*;

    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}
