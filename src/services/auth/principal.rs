use std::collections::BTreeSet;

use serde_json::Value;

use super::claims::Claims;

/// Result of a successful verification.
///
/// Built once per request and handed to the caller; the verifier keeps no
/// copy.
#[derive(Clone)]
pub struct ValidatedPrincipal {
    pub token: String,
    pub client_id: String,
    pub scopes: BTreeSet<String>,
    pub expires_at: Option<i64>,
    pub claims: Claims,
}

impl std::fmt::Debug for ValidatedPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the bearer token
        f.debug_struct("ValidatedPrincipal")
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl ValidatedPrincipal {
    /// Human-facing user name: `sub`, `email`, `preferred_username`,
    /// `username`, then the client id when it is known.
    pub fn username(&self) -> Option<String> {
        ["sub", "email", "preferred_username", "username"]
            .iter()
            .find_map(|name| match self.claims.get(*name) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
            .or_else(|| (self.client_id != "unknown").then(|| self.client_id.clone()))
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}
