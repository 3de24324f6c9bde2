/*
 * Responsibility
 * - Load settings from the environment (.env supported)
 *   - listen address, request limits, bearer authentication
 * - Validate values (invalid input fails startup)
 * - Keep the signing secret out of Debug output
 */
use std::collections::BTreeSet;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// String that never shows up in Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            body_limit_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub enabled: bool,
    pub algorithm: Algorithm,
    pub secret: Option<SecretString>,
    pub public_key_pem: Option<String>,
    pub jwks_uri: Option<Url>,
    pub jwks_cache_ttl: Duration,
    pub issuers: Vec<String>,
    pub audiences: Vec<String>,
    pub required_scopes: BTreeSet<String>,
    // Detailed (tiered logging) verifier instead of the minimal one
    pub debug_errors: bool,
    pub decode_leeway_seconds: Option<u64>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            algorithm: Algorithm::RS256,
            secret: None,
            public_key_pem: None,
            jwks_uri: None,
            jwks_cache_ttl: Duration::from_secs(600),
            issuers: Vec::new(),
            audiences: Vec::new(),
            required_scopes: BTreeSet::new(),
            debug_errors: false,
            decode_leeway_seconds: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub http: HttpSettings,
    pub auth: AuthSettings,
}

fn parse_bool(key: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid(key)),
        },
    }
}

fn parse_number<T: FromStr>(key: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|_| ConfigError::Invalid(key)),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn split_list(value: Option<String>, separators: &[char]) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(|c: char| separators.contains(&c))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Key set endpoints must be https, except on loopback.
fn parse_jwks_uri(value: Option<String>) -> Result<Option<Url>, ConfigError> {
    let Some(raw) = non_empty(value) else {
        return Ok(None);
    };
    let url = Url::parse(&raw).map_err(|_| ConfigError::Invalid("AUTH_JWKS_URI"))?;

    let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));
    match url.scheme() {
        "https" => Ok(Some(url)),
        "http" if loopback => Ok(Some(url)),
        _ => Err(ConfigError::Invalid("AUTH_JWKS_URI")),
    }
}

impl AuthSettings {
    fn from_vars(get: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let algorithm = match non_empty(get("AUTH_JWT_ALGORITHM")) {
            Some(alg) => Algorithm::from_str(&alg)
                .map_err(|_| ConfigError::Invalid("AUTH_JWT_ALGORITHM"))?,
            None => defaults.algorithm,
        };

        let jwks_cache_ttl = parse_number::<u64>(
            "AUTH_JWKS_CACHE_TTL_SECONDS",
            get("AUTH_JWKS_CACHE_TTL_SECONDS"),
        )?
        .map(Duration::from_secs)
        .unwrap_or(defaults.jwks_cache_ttl);

        Ok(Self {
            enabled: parse_bool("AUTH_ENABLED", get("AUTH_ENABLED"))?,
            algorithm,
            secret: non_empty(get("AUTH_JWT_SECRET")).map(SecretString::new),
            public_key_pem: non_empty(get("AUTH_JWT_PUBLIC_KEY_PEM"))
                .map(|pem| pem.replace("\\n", "\n")),
            jwks_uri: parse_jwks_uri(get("AUTH_JWKS_URI"))?,
            jwks_cache_ttl,
            issuers: split_list(get("AUTH_ISSUER"), &[',']),
            audiences: split_list(get("AUTH_AUDIENCE"), &[',']),
            required_scopes: split_list(get("AUTH_REQUIRED_SCOPES"), &[',', ' ', '\t'])
                .into_iter()
                .collect(),
            debug_errors: parse_bool("AUTH_DEBUG_ERRORS", get("AUTH_DEBUG_ERRORS"))?,
            decode_leeway_seconds: parse_number(
                "ACCESS_TOKEN_LEEWAY_SECONDS",
                get("ACCESS_TOKEN_LEEWAY_SECONDS"),
            )?,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = parse_number("PORT", get("PORT"))?.unwrap_or(3000);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::parse(get("APP_ENV"));

        let defaults = HttpSettings::default();
        let http = HttpSettings {
            request_timeout: parse_number::<u64>(
                "REQUEST_TIMEOUT_SECONDS",
                get("REQUEST_TIMEOUT_SECONDS"),
            )?
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout),
            body_limit_bytes: parse_number("REQUEST_BODY_LIMIT_BYTES", get("REQUEST_BODY_LIMIT_BYTES"))?
                .unwrap_or(defaults.body_limit_bytes),
        };

        let auth = AuthSettings::from_vars(&get)?;

        Ok(Self {
            addr,
            app_env,
            http,
            auth,
        })
    }
}
