/*
 * Responsibility
 * - AuthError: authentication failures raised by middleware / extractors
 * - IntoResponse: one fixed RFC 6750 401 response for every cause
 * - The cause only reaches the server-side warn log
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::{FailureCategory, tiered_log};

pub const WWW_AUTHENTICATE_INVALID_TOKEN: &str = r#"Bearer error="invalid_token""#;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    error_description: &'static str,
}

const INVALID_TOKEN: ErrorBody = ErrorBody {
    error: "invalid_token",
    error_description: "Authentication failed",
};

#[derive(Debug, Error)]
pub enum AuthError {
    /// A bearer token was presented and rejected.
    #[error("{0}")]
    InvalidToken(FailureCategory),
    /// A protected route was reached without a validated principal.
    #[error("authentication required")]
    Unauthenticated,
}

/// Generic 401 per RFC 6750 section 3.1.
///
/// `reason` is logged at warn and has no influence on the response.
pub fn unauthorized_response(reason: &AuthError) -> Response {
    tiered_log::rejected(reason);

    (
        StatusCode::UNAUTHORIZED,
        [(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static(WWW_AUTHENTICATE_INVALID_TOKEN),
        )],
        Json(INVALID_TOKEN),
    )
        .into_response()
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        unauthorized_response(&self)
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn parts(response: Response) -> (StatusCode, Vec<(String, Vec<u8>)>, Vec<u8>) {
        let status = response.status();
        let mut headers: Vec<(String, Vec<u8>)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.as_bytes().to_vec()))
            .collect();
        headers.sort();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    #[tokio::test]
    async fn body_and_header_are_fixed() {
        let (status, headers, body) =
            parts(AuthError::InvalidToken(FailureCategory::IssuerMismatch).into_response()).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body,
            br#"{"error":"invalid_token","error_description":"Authentication failed"}"#
        );
        assert!(headers.contains(&(
            "www-authenticate".to_string(),
            br#"Bearer error="invalid_token""#.to_vec()
        )));
        assert!(headers.contains(&(
            "content-type".to_string(),
            b"application/json".to_vec()
        )));
    }

    #[tokio::test]
    async fn every_category_renders_identically() {
        let reference = parts(AuthError::Unauthenticated.into_response()).await;
        for category in FailureCategory::ALL {
            let rendered = parts(AuthError::InvalidToken(category).into_response()).await;
            assert_eq!(rendered, reference, "{category} changed the response");
        }
    }

    #[tokio::test]
    async fn hostile_token_contents_never_reach_the_response() {
        use std::sync::Arc;

        use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
        use serde_json::json;

        use crate::services::auth::TokenValidationPipeline;
        use crate::services::auth::claims::Expected;
        use crate::services::auth::keys::StaticKeyResolver;
        use crate::services::auth::verifier::VerifierSettings;

        const SECRET: &[u8] = b"hs256-signing-value";

        let pipeline = TokenValidationPipeline::new(
            VerifierSettings {
                algorithm: Some(Algorithm::HS256),
                issuer: Some(Expected::One("https://good.example".to_string())),
                audience: Some(Expected::One("api".to_string())),
                required_scopes: ["admin".to_string()].into(),
                decode_leeway_seconds: None,
            },
            Arc::new(StaticKeyResolver::from_secret(SECRET)),
        );
        let reference = parts(AuthError::Unauthenticated.into_response()).await;

        for i in 0..256 {
            let hostile = format!("https://evil-{i}.example\r\nX-Leak: secret=hs256-signing-value");
            let claims = match i % 4 {
                0 => json!({ "iss": hostile, "aud": "api", "scope": "admin" }),
                1 => json!({ "iss": "https://good.example", "aud": [hostile], "scope": "admin" }),
                2 => json!({ "iss": "https://good.example", "aud": "api", "scope": hostile }),
                _ => json!({ "sub": hostile, "exp": i, "scope": "admin" }),
            };
            let token = encode(
                &Header::new(Algorithm::HS256),
                &claims,
                &EncodingKey::from_secret(SECRET),
            )
            .unwrap();

            let category = pipeline.verify_token(&token).await.unwrap_err();
            let rendered = parts(AuthError::InvalidToken(category).into_response()).await;
            assert_eq!(rendered, reference, "token {i} changed the response");
        }
    }
}
