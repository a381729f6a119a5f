//! Teller service error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse` impl.
//! Authorization failures carry a client-visible reason; upstream failures
//! (key distribution) are logged server-side and returned generically.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Reasons a bearer token fails validation.
///
/// The `Display` text is returned to the client as the rejection reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token exceeds maximum allowed size")]
    TooLarge,

    #[error("token is not a well-formed JWT")]
    InvalidFormat,

    #[error("token header is missing a key identifier")]
    MissingKeyId,

    #[error("token signed with an unknown key")]
    UnknownKeyId,

    #[error("invalid signing method")]
    InvalidSigningMethod,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token is expired")]
    Expired,

    #[error("token is not yet valid")]
    NotYetValid,

    #[error("token issued-at time is in the future")]
    IssuedInFuture,

    #[error("invalid aud")]
    InvalidAudience,

    #[error("invalid iss")]
    InvalidIssuer,
}

impl TokenError {
    /// Bounded label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            TokenError::TooLarge => "too_large",
            TokenError::InvalidFormat => "invalid_format",
            TokenError::MissingKeyId => "missing_kid",
            TokenError::UnknownKeyId => "unknown_kid",
            TokenError::InvalidSigningMethod => "invalid_signing_method",
            TokenError::SignatureInvalid => "signature_invalid",
            TokenError::Expired => "expired",
            TokenError::NotYetValid => "not_yet_valid",
            TokenError::IssuedInFuture => "issued_in_future",
            TokenError::InvalidAudience => "invalid_audience",
            TokenError::InvalidIssuer => "invalid_issuer",
        }
    }
}

/// Teller service error type.
///
/// Maps to HTTP status codes:
/// - CredentialMissing, InvalidToken, RoleDenied: 401 Unauthorized
/// - BadRequest: 400 Bad Request
/// - MethodNotSupported: 501 Not Implemented
/// - KeyUnavailable: 503 Service Unavailable
#[derive(Debug, Error)]
pub enum TellerError {
    #[error("No credential provided")]
    CredentialMissing,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Proper role not found for user")]
    RoleDenied,

    #[error("Verification key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Method not supported: {0}")]
    MethodNotSupported(String),
}

impl TellerError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            TellerError::CredentialMissing
            | TellerError::InvalidToken(_)
            | TellerError::RoleDenied => 401,
            TellerError::BadRequest(_) => 400,
            TellerError::MethodNotSupported(_) => 501,
            TellerError::KeyUnavailable(_) => 503,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
}

impl IntoResponse for TellerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            TellerError::CredentialMissing => (
                StatusCode::UNAUTHORIZED,
                "NO_CREDENTIAL",
                "Unauthorized: no credential provided".to_string(),
            ),
            TellerError::InvalidToken(reason) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                format!("Access denied: {}", reason),
            ),
            TellerError::RoleDenied => (
                StatusCode::UNAUTHORIZED,
                "ROLE_DENIED",
                "Proper role not found for user".to_string(),
            ),
            TellerError::KeyUnavailable(reason) => {
                // Log actual reason server-side
                tracing::warn!(target: "teller.availability", reason = %reason, "Verification key unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "KEY_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
            TellerError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone())
            }
            TellerError::MethodNotSupported(reason) => (
                StatusCode::NOT_IMPLEMENTED,
                "METHOD_NOT_SUPPORTED",
                reason.clone(),
            ),
        };

        let mut response = (status, Json(ErrorResponse { code, message })).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) =
                "Bearer realm=\"teller-api\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
