#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use bearer_gate::app::build_router;
use bearer_gate::config::{AuthSettings, HttpSettings, SecretString};
use bearer_gate::services::auth::build_verifier;
use bearer_gate::state::AppState;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

pub const SECRET: &str = "test-secret-key-for-hs256-tokens";
pub const GENERIC_BODY: &[u8] =
    br#"{"error":"invalid_token","error_description":"Authentication failed"}"#;

pub fn now() -> i64 {
    Utc::now().timestamp()
}

pub fn mint_with(header: Header, secret: &str, claims: &Value) -> String {
    encode(&header, claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

pub fn mint(claims: &Value) -> String {
    mint_with(Header::new(Algorithm::HS256), SECRET, claims)
}

pub fn valid_claims() -> Value {
    json!({
        "sub": "user1",
        "iss": "test-issuer",
        "aud": "test-audience",
        "exp": now() + 3600,
    })
}

pub fn claims_with(key: &str, value: Value) -> Value {
    let mut claims = valid_claims();
    claims[key] = value;
    claims
}

pub fn hs256_settings(debug_errors: bool) -> AuthSettings {
    AuthSettings {
        enabled: true,
        algorithm: Algorithm::HS256,
        secret: Some(SecretString::new(SECRET)),
        issuers: vec!["test-issuer".to_string()],
        audiences: vec!["test-audience".to_string()],
        debug_errors,
        ..AuthSettings::default()
    }
}

pub fn app(settings: &AuthSettings) -> Router {
    let verifier = build_verifier(settings).unwrap();
    build_router(AppState::new(verifier), &HttpSettings::default())
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// Everything a client can observe except the per-request id.
    pub fn observable(&self) -> (StatusCode, Vec<(String, Vec<u8>)>, Vec<u8>) {
        let mut headers: Vec<(String, Vec<u8>)> = self
            .headers
            .iter()
            .filter(|(name, _)| name.as_str() != "x-request-id")
            .map(|(name, value)| (name.as_str().to_string(), value.as_bytes().to_vec()))
            .collect();
        headers.sort();
        (self.status, headers, self.body.clone())
    }
}

pub async fn send(app: &Router, path: &str, authorization: Option<&str>) -> Reply {
    let mut request = Request::builder().method("GET").uri(path);
    if let Some(value) = authorization {
        request = request.header(header::AUTHORIZATION, value);
    }

    let response = app
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    Reply {
        status,
        headers,
        body: body.to_vec(),
    }
}

pub async fn send_bearer(app: &Router, path: &str, token: &str) -> Reply {
    send(app, path, Some(&format!("Bearer {token}"))).await
}

/// In-memory sink for `tracing-subscriber` fmt output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn lines_at(&self, level: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.trim_start().starts_with(level))
            .collect()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Capture every event on the current thread until the guard is dropped.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(buffer.clone())
        .with_ansi(false)
        .without_time()
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
