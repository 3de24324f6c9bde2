//! Unverified JOSE header decoding.
//!
//! The header is read before the signature is checked, so it is only used
//! for the algorithm pre-check and as a key selection hint.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde_json::{Map, Value};
use thiserror::Error;

/// Header fields the pipeline reads. A field that is absent or not a string
/// is `None`; deciding what that means is left to the stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHeader {
    pub alg: Option<String>,
    pub typ: Option<String>,
    pub kid: Option<String>,
}

impl DecodedHeader {
    fn from_map(map: &Map<String, Value>) -> Self {
        let text = |name: &str| map.get(name).and_then(Value::as_str).map(str::to_string);
        Self {
            alg: text("alg"),
            typ: text("typ"),
            kid: text("kid"),
        }
    }
}

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("token must have 3 parts (header.payload.signature), got {0}")]
    PartCount(usize),
    #[error("header is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("header is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode the first segment of a compact JWS without verifying anything.
pub fn decode_token_header(token: &str) -> Result<DecodedHeader, HeaderError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(HeaderError::PartCount(parts.len()));
    }

    // Segments are unpadded; restore padding only when needed.
    let mut encoded = parts[0].to_string();
    let pad = (4 - encoded.len() % 4) % 4;
    encoded.extend(std::iter::repeat_n('=', pad));

    let bytes = URL_SAFE.decode(encoded.as_bytes())?;
    let map: Map<String, Value> = serde_json::from_slice(&bytes)?;
    Ok(DecodedHeader::from_map(&map))
}
