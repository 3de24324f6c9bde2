/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 *   - verifier: bearer token verifier, None when authentication is off
 * - Cheap to clone (Arc inside)
 */
use std::sync::Arc;

use crate::services::auth::TokenVerifier;

#[derive(Clone, Default)]
pub struct AppState {
    pub verifier: Option<Arc<dyn TokenVerifier>>,
}

impl AppState {
    pub fn new(verifier: Option<Arc<dyn TokenVerifier>>) -> Self {
        Self { verifier }
    }
}
