//! Generic failure categories reported by the token pipeline.
//!
//! A category is the only failure information that leaves the verifier.
//! Every value is a fixed string from the closed set below; claim values,
//! configuration and library error text never end up in one.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    MalformedHeader,
    AlgorithmMismatch,
    KeyUnavailable,
    InvalidSignature,
    ExpiredAtDecode,
    Expired,
    IssuerMismatch,
    AudienceMismatch,
    MissingScopes,
    DecodeFailed,
    ValidationFailed,
}

impl FailureCategory {
    pub const ALL: [FailureCategory; 11] = [
        Self::MalformedHeader,
        Self::AlgorithmMismatch,
        Self::KeyUnavailable,
        Self::InvalidSignature,
        Self::ExpiredAtDecode,
        Self::Expired,
        Self::IssuerMismatch,
        Self::AudienceMismatch,
        Self::MissingScopes,
        Self::DecodeFailed,
        Self::ValidationFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedHeader => "Malformed token header",
            Self::AlgorithmMismatch => "Algorithm mismatch",
            Self::KeyUnavailable => "Failed to get verification key",
            Self::InvalidSignature => "Signature verification failed",
            Self::ExpiredAtDecode => "Token has expired (detected during decode)",
            Self::Expired => "Token expired",
            Self::IssuerMismatch => "Issuer mismatch",
            Self::AudienceMismatch => "Audience mismatch",
            Self::MissingScopes => "Missing required scopes",
            Self::DecodeFailed => "Token decode failed",
            Self::ValidationFailed => "Token validation failed",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn categories_are_distinct() {
        let texts: HashSet<&str> = FailureCategory::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(texts.len(), FailureCategory::ALL.len());
    }

    #[test]
    fn display_matches_fixed_text() {
        assert_eq!(FailureCategory::IssuerMismatch.to_string(), "Issuer mismatch");
        assert_eq!(
            FailureCategory::ExpiredAtDecode.to_string(),
            "Token has expired (detected during decode)"
        );
    }
}
