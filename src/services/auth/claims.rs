//! Claim lookups used by the verification stages.
//!
//! Claims stay a plain JSON map; every lookup here is an explicit claim
//! name against that map.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

pub type Claims = Map<String, Value>;

/// Client identity candidates, in precedence order.
const CLIENT_ID_CLAIMS: [&str; 3] = ["client_id", "azp", "sub"];
const UNKNOWN_CLIENT: &str = "unknown";
const SCOPE_CLAIMS: [&str; 2] = ["scope", "scp"];

/// A claim carried a JSON type no stage knows how to read.
#[derive(Debug, Error)]
#[error("claim '{claim}' has unexpected type: {found}")]
pub struct ClaimTypeError {
    pub claim: &'static str,
    pub found: &'static str,
}

/// Configured issuer or audience: one value, or a set of accepted values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    One(String),
    Many(Vec<String>),
}

impl Expected {
    /// Build from configuration items. Empty input means "not configured".
    pub fn from_items<I, S>(items: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut values: Vec<String> = items.into_iter().map(Into::into).collect();
        match values.len() {
            0 => None,
            1 => values.pop().map(Self::One),
            _ => Some(Self::Many(values)),
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::One(expected) => expected == value,
            Self::Many(expected) => expected.iter().any(|e| e == value),
        }
    }

    fn values(&self) -> &[String] {
        match self {
            Self::One(expected) => std::slice::from_ref(expected),
            Self::Many(expected) => expected,
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(v) => write!(f, "'{v}'"),
            Self::Many(vs) => write!(f, "{vs:?}"),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn issuer_matches(expected: &Expected, claims: &Claims) -> bool {
    claims
        .get("iss")
        .and_then(Value::as_str)
        .is_some_and(|iss| expected.contains(iss))
}

/// Audience check with overlap semantics: either side may be a single value
/// or a list, and one shared value is enough.
pub fn audience_matches(expected: &Expected, claims: &Claims) -> bool {
    let token_aud: Vec<&str> = match claims.get("aud") {
        Some(Value::String(aud)) => vec![aud.as_str()],
        Some(Value::Array(auds)) => auds.iter().filter_map(Value::as_str).collect(),
        _ => return false,
    };

    expected
        .values()
        .iter()
        .any(|e| token_aud.contains(&e.as_str()))
}

/// Numeric `exp` claim, if present.
pub fn expiry(claims: &Claims) -> Result<Option<f64>, ClaimTypeError> {
    match claims.get("exp") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or(ClaimTypeError {
            claim: "exp",
            found: "number",
        }),
        Some(other) => Err(ClaimTypeError {
            claim: "exp",
            found: type_name(other),
        }),
    }
}

/// Normalized scope set from `scope`, falling back to `scp`.
///
/// A string is split on whitespace; a list must hold only strings.
pub fn scopes(claims: &Claims) -> Result<BTreeSet<String>, ClaimTypeError> {
    for claim in SCOPE_CLAIMS {
        match claims.get(claim) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) => {
                return Ok(s.split_whitespace().map(str::to_string).collect());
            }
            Some(Value::Array(items)) => {
                return items
                    .iter()
                    .map(|item| {
                        item.as_str().map(str::to_string).ok_or(ClaimTypeError {
                            claim,
                            found: type_name(item),
                        })
                    })
                    .collect();
            }
            Some(other) => {
                return Err(ClaimTypeError {
                    claim,
                    found: type_name(other),
                });
            }
        }
    }
    Ok(BTreeSet::new())
}

/// `client_id`, then `azp`, then `sub`, else "unknown".
pub fn client_identity(claims: &Claims) -> String {
    CLIENT_ID_CLAIMS
        .iter()
        .find_map(|name| match claims.get(*name) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
