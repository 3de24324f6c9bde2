/*
 * Responsibility
 * - The "authenticated context" type handlers see
 * - The bearer middleware verifies the token and stores it in request extensions
 *
 * Notes
 * - Token verification lives in services::auth; this is only the contract
 */
use crate::services::auth::ValidatedPrincipal;

/// Context attached to authenticated requests.
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub principal: ValidatedPrincipal,
}

impl AuthCtx {
    pub fn new(principal: ValidatedPrincipal) -> Self {
        Self { principal }
    }

    pub fn client_id(&self) -> &str {
        &self.principal.client_id
    }
}
