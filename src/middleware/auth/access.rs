//! Bearer token verification → `AuthCtx` in request extensions.
//!
//! - No `Authorization: Bearer` header: the request continues anonymously.
//!   Whether that is acceptable is decided by the route (`AuthCtxExtractor`).
//! - Token verified: `AuthCtx` is inserted and the request continues.
//! - Token rejected: the category left in the failure channel is raised as
//!   `AuthError::InvalidToken`, which renders the generic 401.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AuthError;
use crate::middleware::bearer_auth::bearer_token;
use crate::services::auth::{FailureChannel, TokenVerifier, ValidatedPrincipal};
use crate::state::AppState;

/// Apply bearer authentication to every route of `router`.
///
/// Ex:
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::auth::access::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // from_fn cannot extract State in axum 0.8; pass it with from_fn_with_state
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

/// Verify `token` with a fresh failure channel.
///
/// - `Ok(Some(_))`: verified
/// - `Ok(None)`: rejected without a category (treated as anonymous)
/// - `Err(_)`: rejected with a category
pub async fn authenticate(
    verifier: &dyn TokenVerifier,
    token: &str,
) -> Result<Option<ValidatedPrincipal>, AuthError> {
    let mut channel = FailureChannel::new();

    if let Some(principal) = verifier.load_access_token(token, &mut channel).await {
        return Ok(Some(principal));
    }

    match channel.take() {
        Some(category) => Err(AuthError::InvalidToken(category)),
        None => Ok(None),
    }
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(verifier) = state.verifier.as_deref() else {
        return Ok(next.run(req).await);
    };
    let Some(token) = bearer_token(req.headers()).map(str::to_owned) else {
        return Ok(next.run(req).await);
    };

    if let Some(principal) = authenticate(verifier, &token).await? {
        // handed to AuthCtxExtractor
        req.extensions_mut().insert(AuthCtx::new(principal));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use async_trait::async_trait;

    use super::*;
    use crate::services::auth::FailureCategory;

    /// Verifier with a scripted outcome.
    struct Scripted(Option<FailureCategory>, bool);

    #[async_trait]
    impl TokenVerifier for Scripted {
        async fn load_access_token(
            &self,
            token: &str,
            channel: &mut FailureChannel,
        ) -> Option<ValidatedPrincipal> {
            if self.1 {
                return Some(ValidatedPrincipal {
                    token: token.to_string(),
                    client_id: "svc".to_string(),
                    scopes: BTreeSet::new(),
                    expires_at: None,
                    claims: Default::default(),
                });
            }
            if let Some(category) = self.0 {
                channel.set(category);
            }
            None
        }
    }

    #[tokio::test]
    async fn failure_with_category_raises() {
        let verifier = Scripted(Some(FailureCategory::AudienceMismatch), false);
        let err = authenticate(&verifier, "t").await.unwrap_err();

        assert!(matches!(
            err,
            AuthError::InvalidToken(FailureCategory::AudienceMismatch)
        ));
    }

    #[tokio::test]
    async fn failure_without_category_is_anonymous() {
        let verifier = Scripted(None, false);
        assert!(authenticate(&verifier, "t").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn success_passes_principal_through() {
        let verifier = Scripted(None, true);
        let principal = authenticate(&verifier, "t").await.unwrap().unwrap();
        assert_eq!(principal.client_id, "svc");
    }
}
