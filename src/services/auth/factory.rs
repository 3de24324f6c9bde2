/// Factory: build the bearer token verifier from `AuthSettings`.
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::AuthSettings;
use crate::services::auth::claims::Expected;
use crate::services::auth::keys::{JwksKeyResolver, KeyResolver, StaticKeyResolver};
use crate::services::auth::verifier::{
    DetailedJwtVerifier, MinimalJwtVerifier, TokenValidationPipeline, TokenVerifier,
    VerifierSettings,
};

// Variants carry no source error: key parsing errors may quote key material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FactoryError {
    #[error("failed to create key set client")]
    KeySetClient,
    #[error("configured public key is not usable for the configured algorithm")]
    PublicKey,
}

fn is_hmac(algorithm: jsonwebtoken::Algorithm) -> bool {
    use jsonwebtoken::Algorithm::{HS256, HS384, HS512};
    matches!(algorithm, HS256 | HS384 | HS512)
}

fn build_key_resolver(settings: &AuthSettings) -> Result<Arc<dyn KeyResolver>, FactoryError> {
    if is_hmac(settings.algorithm)
        && let Some(secret) = &settings.secret
    {
        return Ok(Arc::new(StaticKeyResolver::from_secret(
            secret.expose().as_bytes(),
        )));
    }

    if let Some(jwks_uri) = &settings.jwks_uri {
        let resolver = JwksKeyResolver::new(jwks_uri.clone(), settings.jwks_cache_ttl)
            .map_err(|_| FactoryError::KeySetClient)?;
        return Ok(Arc::new(resolver));
    }

    match &settings.public_key_pem {
        Some(pem) => StaticKeyResolver::from_public_pem(settings.algorithm, pem)
            .map(|r| Arc::new(r) as Arc<dyn KeyResolver>)
            .map_err(|_| FactoryError::PublicKey),
        // An HMAC secret configured alongside a non-HMAC algorithm.
        None => Err(FactoryError::PublicKey),
    }
}

/// Returns `Ok(None)` when authentication is disabled or no key source is
/// configured; requests are then anonymous.
pub fn build_verifier(
    settings: &AuthSettings,
) -> Result<Option<Arc<dyn TokenVerifier>>, FactoryError> {
    if !settings.enabled {
        return Ok(None);
    }

    if settings.secret.is_none() && settings.public_key_pem.is_none() && settings.jwks_uri.is_none()
    {
        warn!("AUTH_ENABLED is true but no JWT keys/secret configured");
        return Ok(None);
    }

    let keys = build_key_resolver(settings).inspect_err(|e| {
        // The underlying error is not logged, it may contain the secret.
        error!(reason = %e, "failed to create auth provider");
    })?;

    let pipeline = TokenValidationPipeline::new(
        VerifierSettings {
            algorithm: Some(settings.algorithm),
            issuer: Expected::from_items(settings.issuers.iter().cloned()),
            audience: Expected::from_items(settings.audiences.iter().cloned()),
            required_scopes: settings.required_scopes.clone(),
            decode_leeway_seconds: settings.decode_leeway_seconds,
        },
        keys,
    );

    let verifier: Arc<dyn TokenVerifier> = if settings.debug_errors {
        info!(algorithm = ?settings.algorithm, "bearer auth enabled (detailed verifier)");
        Arc::new(DetailedJwtVerifier::new(pipeline))
    } else {
        info!(algorithm = ?settings.algorithm, "bearer auth enabled (minimal verifier)");
        Arc::new(MinimalJwtVerifier::new(pipeline))
    };

    Ok(Some(verifier))
}
