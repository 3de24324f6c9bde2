use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AuthError;

use super::AuthCtx;

/// Extractor for handlers that require an authenticated caller.
///
/// The bearer middleware inserts `AuthCtx` on success. When it is missing
/// (no token, minimal verifier rejection, auth disabled) the request is
/// rejected with the same generic 401 as a failed token.
pub struct AuthCtxExtractor(pub AuthCtx);

impl<S> FromRequestParts<S> for AuthCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthCtx>()
            .cloned()
            .map(AuthCtxExtractor)
            .ok_or(AuthError::Unauthenticated)
    }
}
