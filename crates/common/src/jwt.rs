//! JWT utilities shared across Teller services.
//!
//! This module provides the token-format checks that run before any
//! cryptographic work:
//! - Size limits for DoS prevention
//! - Clock skew constants for time-based claim validation
//! - Unverified header inspection (`alg` and `kid`)
//! - RSA signing-algorithm allow-list
//! - iat validation logic
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Header values are untrusted until the signature has been verified;
//!   `kid` is only used to select a key, `alg` is only used to reject
//! - Error messages are generic, details go to debug logs
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{inspect_header, is_rsa_algorithm, validate_iat, DEFAULT_CLOCK_SKEW};
//!
//! let header = inspect_header(token)?;
//! if !is_rsa_algorithm(&header.alg) {
//!     return Err("unexpected signing method");
//! }
//!
//! // After signature verification, validate iat
//! validate_iat(claims.iat, DEFAULT_CLOCK_SKEW)?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Typical RS256 access tokens are well under 2KB. Anything larger is
/// rejected before base64 decoding or signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default JWT clock skew tolerance (5 minutes per NIST SP 800-63B).
///
/// Applied as leeway to `exp` and `nbf`, and as the maximum amount an
/// `iat` may lie in the future.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Maximum allowed JWT clock skew tolerance (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Signing algorithms accepted for verification.
///
/// Only the PKCS#1 v1.5 RSA family is accepted. HMAC algorithms are
/// excluded so a public key can never be used as an HMAC secret.
pub const RSA_ALGORITHMS: [&str; 3] = ["RS256", "RS384", "RS512"];

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while inspecting a token before verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("token exceeds maximum allowed size")]
    TokenTooLarge,

    /// Token is not a three-part JWS compact serialization with a JSON header.
    #[error("token is not a well-formed JWT")]
    MalformedToken,

    /// Token `iat` claim is too far in the future.
    #[error("token issued-at time is in the future")]
    IatTooFarInFuture,
}

// =============================================================================
// Header Types
// =============================================================================

/// Unverified JWT header fields needed to pick a key and a verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    /// Signing algorithm named by the token (e.g. `RS256`).
    pub alg: String,

    /// Key identifier, if present and a non-empty string.
    pub kid: Option<String>,
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
    #[serde(default)]
    kid: Option<serde_json::Value>,
}

// =============================================================================
// Functions
// =============================================================================

/// Inspect the JWT header without verifying the signature.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `MalformedToken` - wrong number of segments, bad base64, invalid JSON,
///   or no `alg` field
pub fn inspect_header(token: &str) -> Result<TokenHeader, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let header_part = parts.first().ok_or(JwtValidationError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let raw: RawHeader = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    // Non-string or empty kid is treated as absent
    let kid = raw
        .kid
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string);

    Ok(TokenHeader { alg: raw.alg, kid })
}

/// Returns true if `alg` names an accepted RSA signing algorithm.
#[must_use]
pub fn is_rsa_algorithm(alg: &str) -> bool {
    RSA_ALGORITHMS.contains(&alg)
}

/// Validate the `iat` (issued-at) claim with clock skew tolerance.
///
/// # Errors
///
/// Returns `JwtValidationError::IatTooFarInFuture` if the iat timestamp is more than
/// `clock_skew` in the future.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    let now = chrono::Utc::now().timestamp();
    validate_iat_at(iat, clock_skew, now)
}

/// Deterministic `iat` validation against an explicit `now` timestamp.
pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), JwtValidationError> {
    // Safe cast: clock_skew is bounded to MAX_CLOCK_SKEW (600 seconds)
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;
    let max_iat = now + clock_skew_secs;

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            "Token rejected: iat too far in the future"
        );
        return Err(JwtValidationError::IatTooFarInFuture);
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn token_with_header(header: &str) -> String {
        format!("{}.payload.signature", URL_SAFE_NO_PAD.encode(header.as_bytes()))
    }

    #[test]
    fn test_max_jwt_size_is_8kb() {
        assert_eq!(MAX_JWT_SIZE_BYTES, 8192);
    }

    #[test]
    fn test_clock_skew_bounds() {
        assert_eq!(DEFAULT_CLOCK_SKEW, Duration::from_secs(300));
        assert_eq!(MAX_CLOCK_SKEW, Duration::from_secs(600));
    }

    #[test]
    fn test_inspect_header_valid_token() {
        let token = token_with_header(r#"{"alg":"RS256","typ":"JWT","kid":"key-01"}"#);

        let header = inspect_header(&token).unwrap();
        assert_eq!(header.alg, "RS256");
        assert_eq!(header.kid.as_deref(), Some("key-01"));
    }

    #[test]
    fn test_inspect_header_missing_kid() {
        let token = token_with_header(r#"{"alg":"RS256","typ":"JWT"}"#);

        let header = inspect_header(&token).unwrap();
        assert!(header.kid.is_none());
    }

    #[test]
    fn test_inspect_header_empty_or_non_string_kid_is_absent() {
        let empty = token_with_header(r#"{"alg":"RS256","kid":""}"#);
        let numeric = token_with_header(r#"{"alg":"RS256","kid":12345}"#);
        let null = token_with_header(r#"{"alg":"RS256","kid":null}"#);

        assert!(inspect_header(&empty).unwrap().kid.is_none());
        assert!(inspect_header(&numeric).unwrap().kid.is_none());
        assert!(inspect_header(&null).unwrap().kid.is_none());
    }

    #[test]
    fn test_inspect_header_keeps_unknown_algorithms() {
        // Rejection of unexpected algorithms is the caller's decision
        let token = token_with_header(r#"{"alg":"none","kid":"key-01"}"#);

        let header = inspect_header(&token).unwrap();
        assert_eq!(header.alg, "none");
    }

    #[test]
    fn test_inspect_header_malformed_token() {
        assert_eq!(
            inspect_header("not.a.valid.jwt.format"),
            Err(JwtValidationError::MalformedToken)
        );
        assert_eq!(inspect_header("only.two"), Err(JwtValidationError::MalformedToken));
        assert_eq!(inspect_header("single"), Err(JwtValidationError::MalformedToken));
        assert_eq!(inspect_header(""), Err(JwtValidationError::MalformedToken));
        assert_eq!(
            inspect_header(".payload.signature"),
            Err(JwtValidationError::MalformedToken)
        );
    }

    #[test]
    fn test_inspect_header_invalid_base64() {
        assert_eq!(
            inspect_header("!!!invalid!!!.payload.signature"),
            Err(JwtValidationError::MalformedToken)
        );
    }

    #[test]
    fn test_inspect_header_invalid_json() {
        let token = token_with_header("not valid json");
        assert_eq!(inspect_header(&token), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_inspect_header_missing_alg() {
        let token = token_with_header(r#"{"typ":"JWT","kid":"key-01"}"#);
        assert_eq!(inspect_header(&token), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_inspect_header_oversized_token() {
        let token = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        assert_eq!(inspect_header(&token), Err(JwtValidationError::TokenTooLarge));
    }

    #[test]
    fn test_inspect_header_at_size_limit_is_parsed() {
        let header = token_with_header(r#"{"alg":"RS256","kid":"key-01"}"#);
        let padding = "a".repeat(MAX_JWT_SIZE_BYTES - header.len());
        let token = format!("{}{}", header, padding);
        assert_eq!(token.len(), MAX_JWT_SIZE_BYTES);

        let parsed = inspect_header(&token).unwrap();
        assert_eq!(parsed.kid.as_deref(), Some("key-01"));
    }

    #[test]
    fn test_is_rsa_algorithm() {
        assert!(is_rsa_algorithm("RS256"));
        assert!(is_rsa_algorithm("RS384"));
        assert!(is_rsa_algorithm("RS512"));

        assert!(!is_rsa_algorithm("HS256"));
        assert!(!is_rsa_algorithm("ES256"));
        assert!(!is_rsa_algorithm("EdDSA"));
        assert!(!is_rsa_algorithm("PS256"));
        assert!(!is_rsa_algorithm("none"));
        assert!(!is_rsa_algorithm("rs256"));
    }

    #[test]
    fn test_validate_iat_past_and_present() {
        let now = 1_700_000_000;
        assert!(validate_iat_at(now, DEFAULT_CLOCK_SKEW, now).is_ok());
        assert!(validate_iat_at(now - 3600, DEFAULT_CLOCK_SKEW, now).is_ok());
    }

    #[test]
    fn test_validate_iat_at_clock_skew_boundary() {
        let now = 1_700_000_000;
        assert!(validate_iat_at(now + 300, DEFAULT_CLOCK_SKEW, now).is_ok());
        assert_eq!(
            validate_iat_at(now + 301, DEFAULT_CLOCK_SKEW, now),
            Err(JwtValidationError::IatTooFarInFuture)
        );
    }

    #[test]
    fn test_validate_iat_uses_wall_clock() {
        let now = chrono::Utc::now().timestamp();
        assert!(validate_iat(now, DEFAULT_CLOCK_SKEW).is_ok());
        assert!(validate_iat(now + 3600, DEFAULT_CLOCK_SKEW).is_err());
    }
}
