//! Bearer token verification pipeline.
//!
//! Stages run strictly in order and the first failing stage decides the
//! category:
//!
//! 1. header decode
//! 2. algorithm pre-check
//! 3. key resolution (may await a remote key set)
//! 4. signature + claim decode
//! 5. `exp`
//! 6. `iss`
//! 7. `aud`
//! 8. required scopes
//!
//! Each stage returns `Result<_, StageError>`. Detail goes to the debug tier
//! only; callers see nothing but a `FailureCategory`.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use super::category::FailureCategory;
use super::channel::FailureChannel;
use super::claims::{self, ClaimTypeError, Claims, Expected};
use super::header::{DecodedHeader, decode_token_header};
use super::keys::KeyResolver;
use super::principal::ValidatedPrincipal;
use super::tiered_log;

/// Static verification policy.
#[derive(Debug, Clone, Default)]
pub struct VerifierSettings {
    pub algorithm: Option<Algorithm>,
    pub issuer: Option<Expected>,
    pub audience: Option<Expected>,
    pub required_scopes: BTreeSet<String>,
    /// When set, the JWT library also rejects expired tokens during decode,
    /// allowing this much clock skew.
    pub decode_leeway_seconds: Option<u64>,
}

enum StageError {
    Failed(FailureCategory),
    /// Anything no stage has a category for (malformed claim types etc.).
    Unexpected(String),
}

impl From<ClaimTypeError> for StageError {
    fn from(e: ClaimTypeError) -> Self {
        Self::Unexpected(e.to_string())
    }
}

type Stage<T> = Result<T, StageError>;

fn fail<T>(category: FailureCategory) -> Stage<T> {
    Err(StageError::Failed(category))
}

fn now_seconds() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

pub struct TokenValidationPipeline {
    settings: VerifierSettings,
    validation: Validation,
    keys: Arc<dyn KeyResolver>,
}

impl std::fmt::Debug for TokenValidationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenValidationPipeline")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl TokenValidationPipeline {
    pub fn new(settings: VerifierSettings, keys: Arc<dyn KeyResolver>) -> Self {
        // Issuer, audience and (by default) expiry are checked by the
        // pipeline's own stages, so the library only verifies the signature.
        let mut validation = Validation::new(settings.algorithm.unwrap_or(Algorithm::HS256));
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        validation.validate_nbf = false;
        match settings.decode_leeway_seconds {
            Some(leeway) => {
                validation.validate_exp = true;
                validation.leeway = leeway;
            }
            None => validation.validate_exp = false,
        }

        Self {
            settings,
            validation,
            keys,
        }
    }

    /// Run every stage. The error side is always a generic category.
    pub async fn verify_token(&self, token: &str) -> Result<ValidatedPrincipal, FailureCategory> {
        match self.run_stages(token).await {
            Ok(principal) => Ok(principal),
            Err(StageError::Failed(category)) => Err(category),
            Err(StageError::Unexpected(detail)) => {
                let category = FailureCategory::ValidationFailed;
                tiered_log::detail(category, format_args!("Token validation failed: {detail}"));
                Err(category)
            }
        }
    }

    async fn run_stages(&self, token: &str) -> Stage<ValidatedPrincipal> {
        let header = self.decode_header(token)?;
        let algorithm = self.check_algorithm(&header)?;
        let key = self.resolve_key(&header).await?;
        let claims = self.decode_claims(token, &key, algorithm)?;

        let client_id = claims::client_identity(&claims);
        let exp = self.check_expiry(&claims, &client_id)?;
        self.check_issuer(&claims)?;
        self.check_audience(&claims)?;
        let scopes = self.check_scopes(&claims)?;

        Ok(ValidatedPrincipal {
            token: token.to_string(),
            client_id,
            scopes,
            expires_at: exp.map(|e| e as i64),
            claims,
        })
    }

    fn decode_header(&self, token: &str) -> Stage<DecodedHeader> {
        decode_token_header(token).or_else(|e| {
            let category = FailureCategory::MalformedHeader;
            tiered_log::detail(category, format_args!("Malformed token header: {e}"));
            fail(category)
        })
    }

    fn check_algorithm(&self, header: &DecodedHeader) -> Stage<Algorithm> {
        let token_alg = header
            .alg
            .as_deref()
            .and_then(|alg| alg.parse::<Algorithm>().ok());

        match self.settings.algorithm {
            Some(required) if token_alg == Some(required) => Ok(required),
            Some(required) => {
                let category = FailureCategory::AlgorithmMismatch;
                tiered_log::detail(
                    category,
                    format_args!(
                        "Algorithm mismatch: token uses {:?}, expected '{:?}'",
                        header.alg, required
                    ),
                );
                fail(category)
            }
            None => token_alg.map_or_else(
                || {
                    let category = FailureCategory::DecodeFailed;
                    tiered_log::detail(
                        category,
                        format_args!("Token decode failed: unsupported alg {:?}", header.alg),
                    );
                    fail(category)
                },
                Ok,
            ),
        }
    }

    async fn resolve_key(&self, header: &DecodedHeader) -> Stage<DecodingKey> {
        match self.keys.resolve(header).await {
            Ok(key) => Ok(key),
            Err(e) => {
                let category = FailureCategory::KeyUnavailable;
                tiered_log::detail(category, format_args!("Failed to get verification key: {e}"));
                fail(category)
            }
        }
    }

    fn decode_claims(&self, token: &str, key: &DecodingKey, algorithm: Algorithm) -> Stage<Claims> {
        let mut validation = self.validation.clone();
        validation.algorithms = vec![algorithm];

        match jsonwebtoken::decode::<Claims>(token, key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::InvalidSignature => fail(FailureCategory::InvalidSignature),
                ErrorKind::ExpiredSignature => fail(FailureCategory::ExpiredAtDecode),
                _ => {
                    let category = FailureCategory::DecodeFailed;
                    tiered_log::detail(category, format_args!("Token decode failed: {e}"));
                    fail(category)
                }
            },
        }
    }

    fn check_expiry(&self, claims: &Claims, client_id: &str) -> Stage<Option<f64>> {
        let exp = claims::expiry(claims)?;
        if let Some(exp) = exp
            && exp < now_seconds()
        {
            let category = FailureCategory::Expired;
            tiered_log::detail(category, format_args!("Token expired for client '{client_id}'"));
            return fail(category);
        }
        Ok(exp)
    }

    fn check_issuer(&self, claims: &Claims) -> Stage<()> {
        let Some(expected) = &self.settings.issuer else {
            return Ok(());
        };
        if claims::issuer_matches(expected, claims) {
            return Ok(());
        }

        let category = FailureCategory::IssuerMismatch;
        tiered_log::detail(
            category,
            format_args!(
                "Issuer mismatch: token has {:?}, expected {expected}",
                claims.get("iss")
            ),
        );
        fail(category)
    }

    fn check_audience(&self, claims: &Claims) -> Stage<()> {
        let Some(expected) = &self.settings.audience else {
            return Ok(());
        };
        if claims::audience_matches(expected, claims) {
            return Ok(());
        }

        let category = FailureCategory::AudienceMismatch;
        tiered_log::detail(
            category,
            format_args!(
                "Audience mismatch: token has {:?}, expected {expected}",
                claims.get("aud")
            ),
        );
        fail(category)
    }

    fn check_scopes(&self, claims: &Claims) -> Stage<BTreeSet<String>> {
        let scopes = claims::scopes(claims)?;
        let required = &self.settings.required_scopes;
        if required.is_subset(&scopes) {
            return Ok(scopes);
        }

        let missing: BTreeSet<&String> = required.difference(&scopes).collect();
        let category = FailureCategory::MissingScopes;
        tiered_log::detail(
            category,
            format_args!("Missing required scopes: {missing:?}. Token has: {scopes:?}"),
        );
        fail(category)
    }
}

/// Entry point used by the bearer middleware.
///
/// On failure the verifier may leave a category in `channel`; on success the
/// channel is left empty.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn load_access_token(
        &self,
        token: &str,
        channel: &mut FailureChannel,
    ) -> Option<ValidatedPrincipal>;
}

/// Verifier that publishes a failure category for every rejected token.
#[derive(Debug)]
pub struct DetailedJwtVerifier {
    pipeline: TokenValidationPipeline,
}

impl DetailedJwtVerifier {
    pub fn new(pipeline: TokenValidationPipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl TokenVerifier for DetailedJwtVerifier {
    async fn load_access_token(
        &self,
        token: &str,
        channel: &mut FailureChannel,
    ) -> Option<ValidatedPrincipal> {
        channel.clear();

        match self.pipeline.verify_token(token).await {
            Ok(principal) => {
                channel.clear();
                Some(principal)
            }
            Err(category) => {
                channel.set(category);
                None
            }
        }
    }
}

/// Verifier that rejects silently: the request continues as anonymous and
/// the route's own policy answers.
#[derive(Debug)]
pub struct MinimalJwtVerifier {
    pipeline: TokenValidationPipeline,
}

impl MinimalJwtVerifier {
    pub fn new(pipeline: TokenValidationPipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl TokenVerifier for MinimalJwtVerifier {
    async fn load_access_token(
        &self,
        token: &str,
        channel: &mut FailureChannel,
    ) -> Option<ValidatedPrincipal> {
        channel.clear();
        self.pipeline.verify_token(token).await.ok()
    }
}
