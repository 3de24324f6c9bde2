/*
 * Responsibility
 * - Bearer token extraction from the Authorization header
 * - Header name is case-insensitive (HeaderMap), the scheme is matched case-insensitively
 * - No verification here (see middleware::auth::access)
 */
use axum::http::{HeaderMap, header};

const BEARER_PREFIX: &str = "bearer ";

/// Returns the token of an `Authorization: Bearer <token>` header, or `None`
/// when the header is absent, unreadable, or uses another scheme.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let scheme = value.get(..BEARER_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }

    let token = value[BEARER_PREFIX.len()..].trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderName, HeaderValue};

    use super::*;

    fn headers(name: &str, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        // from_bytes lowercases, the way names arrive off the wire
        let name = HeaderName::from_bytes(name.as_bytes()).unwrap();
        headers.insert(name, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(
            bearer_token(&headers("authorization", "Bearer abc.def.ghi")),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn scheme_and_header_name_are_case_insensitive() {
        assert_eq!(
            bearer_token(&headers("Authorization", "bearer abc.def.ghi")),
            Some("abc.def.ghi")
        );
        assert_eq!(
            bearer_token(&headers("AUTHORIZATION", "BEARER abc.def.ghi")),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn other_schemes_and_missing_header_are_ignored() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers("authorization", "Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&headers("authorization", "Bearer")), None);
        assert_eq!(bearer_token(&headers("authorization", "Bearer   ")), None);
    }
}
