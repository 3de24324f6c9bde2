//! Verification key resolution.
//!
//! - `StaticKeyResolver`: one fixed key (HMAC secret or public key PEM).
//! - `JwksKeyResolver`: remote key set selected by `kid`, cached as an
//!   immutable snapshot.
//!
//! Key material is never printable via Debug.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use super::header::DecodedHeader;
use super::tiered_log::TARGET;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
    #[error("key set endpoint returned status {0}")]
    Status(u16),
    #[error("key set contains no keys")]
    EmptySet,
    #[error("no key with kid '{0}' in key set")]
    UnknownKid(String),
    #[error("token has no kid and key set holds {0} keys")]
    AmbiguousKey(usize),
    #[error("unusable key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
    #[error("algorithm {0:?} cannot use a PEM public key")]
    UnsupportedAlgorithm(Algorithm),
}

#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve(&self, header: &DecodedHeader) -> Result<DecodingKey, KeyError>;
}

#[derive(Clone)]
pub struct StaticKeyResolver {
    key: DecodingKey,
}

impl std::fmt::Debug for StaticKeyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticKeyResolver").finish_non_exhaustive()
    }
}

impl StaticKeyResolver {
    pub fn new(key: DecodingKey) -> Self {
        Self { key }
    }

    pub fn from_secret(secret: &[u8]) -> Self {
        Self::new(DecodingKey::from_secret(secret))
    }

    /// Public key PEM, parsed according to the algorithm family.
    pub fn from_public_pem(algorithm: Algorithm, pem: &str) -> Result<Self, KeyError> {
        let pem = pem.as_bytes();
        let key = match algorithm {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => DecodingKey::from_rsa_pem(pem)?,
            Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem)?,
            Algorithm::EdDSA => DecodingKey::from_ed_pem(pem)?,
            other => return Err(KeyError::UnsupportedAlgorithm(other)),
        };
        Ok(Self::new(key))
    }
}

#[async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn resolve(&self, _header: &DecodedHeader) -> Result<DecodingKey, KeyError> {
        Ok(self.key.clone())
    }
}

struct CachedJwks {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Remote key set client.
///
/// The cache slot holds an `Arc` snapshot that is replaced wholesale after a
/// fetch. Readers never see a partially written set; concurrent misses may
/// fetch more than once.
pub struct JwksKeyResolver {
    jwks_uri: Url,
    http: reqwest::Client,
    cache_ttl: Duration,
    cache: RwLock<Option<Arc<CachedJwks>>>,
}

impl std::fmt::Debug for JwksKeyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksKeyResolver")
            .field("jwks_uri", &self.jwks_uri.as_str())
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl JwksKeyResolver {
    pub fn new(jwks_uri: Url, cache_ttl: Duration) -> Result<Self, KeyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            jwks_uri,
            http,
            cache_ttl,
            cache: RwLock::new(None),
        })
    }

    async fn key_set(&self) -> Result<Arc<CachedJwks>, KeyError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref()
                && cached.fetched_at.elapsed() < self.cache_ttl
            {
                return Ok(Arc::clone(cached));
            }
        }

        let fresh = Arc::new(self.fetch().await?);
        *self.cache.write().await = Some(Arc::clone(&fresh));
        Ok(fresh)
    }

    async fn fetch(&self) -> Result<CachedJwks, KeyError> {
        debug!(target: TARGET, jwks_uri = %self.jwks_uri, "fetching key set");

        let response = self.http.get(self.jwks_uri.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(KeyError::Status(status.as_u16()));
        }

        let jwks: JwkSet = response.json().await?;
        if jwks.keys.is_empty() {
            return Err(KeyError::EmptySet);
        }

        debug!(target: TARGET, keys = jwks.keys.len(), "key set cached");
        Ok(CachedJwks {
            jwks,
            fetched_at: Instant::now(),
        })
    }
}

#[async_trait]
impl KeyResolver for JwksKeyResolver {
    async fn resolve(&self, header: &DecodedHeader) -> Result<DecodingKey, KeyError> {
        let cached = self.key_set().await?;
        let keys = &cached.jwks.keys;

        let jwk = match header.kid.as_deref() {
            Some(kid) => cached
                .jwks
                .find(kid)
                .ok_or_else(|| KeyError::UnknownKid(kid.to_string()))?,
            None if keys.len() == 1 => &keys[0],
            None => return Err(KeyError::AmbiguousKey(keys.len())),
        };

        Ok(DecodingKey::from_jwk(jwk)?)
    }
}
