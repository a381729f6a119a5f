//! JWT validation for the teller service.
//!
//! Validates incoming bearer tokens using RSA public keys obtained from the
//! identity provider.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Only the RSA family (RS256/RS384/RS512) is accepted; the algorithm is
//!   checked before any key lookup, so HMAC tokens never reach a key
//! - `exp` is required, `nbf` is honored, both with clock skew leeway
//! - `aud` and `iss` must be present and equal the configured values
//! - `iat`, when present, must not be in the future beyond the clock skew

use crate::auth::claims::Claims;
use crate::auth::public_key::KeySource;
use crate::errors::{TellerError, TokenError};
use common::jwt::{inspect_header, is_rsa_algorithm, validate_iat, JwtValidationError};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// JWT validator bound to a key source and the expected audience/issuer.
pub struct TokenValidator {
    /// Source of verification keys.
    keys: Arc<dyn KeySource>,

    /// Expected `aud` claim.
    audience: String,

    /// Expected `iss` claim.
    issuer: String,

    /// Leeway for time-based claims.
    clock_skew: Duration,
}

impl TokenValidator {
    /// Create a new token validator.
    pub fn new(
        keys: Arc<dyn KeySource>,
        audience: String,
        issuer: String,
        clock_skew: Duration,
    ) -> Self {
        Self {
            keys,
            audience,
            issuer,
            clock_skew,
        }
    }

    /// Validate a raw bearer token and return its claims.
    ///
    /// # Checks
    ///
    /// 1. Size and structure of the token
    /// 2. Signing algorithm is in the RSA family
    /// 3. `kid` present in the header
    /// 4. Key lookup via the key source
    /// 5. Signature, `exp`, `nbf`, `aud`, `iss`
    /// 6. `iat` not in the future
    ///
    /// # Errors
    ///
    /// Returns `TellerError::InvalidToken` with the specific [`TokenError`],
    /// or `TellerError::KeyUnavailable` if the key cannot be obtained.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<Claims, TellerError> {
        let header = inspect_header(token).map_err(|e| {
            tracing::debug!(target: "teller.auth.jwt", error = %e, "Token header inspection failed");
            match e {
                JwtValidationError::TokenTooLarge => TokenError::TooLarge,
                _ => TokenError::InvalidFormat,
            }
        })?;

        if !is_rsa_algorithm(&header.alg) {
            tracing::warn!(target: "teller.auth.jwt", alg = %header.alg, "Token rejected: unexpected signing method");
            return Err(TokenError::InvalidSigningMethod.into());
        }
        let algorithm =
            Algorithm::from_str(&header.alg).map_err(|_| TokenError::InvalidSigningMethod)?;

        let kid = header.kid.ok_or_else(|| {
            tracing::debug!(target: "teller.auth.jwt", "Token rejected: missing kid");
            TokenError::MissingKeyId
        })?;

        let key = self.keys.get_verification_key(&kid).await?;

        let claims = self.verify(token, &key, algorithm)?;

        if let Some(iat) = claims.iat {
            if let Err(e) = validate_iat(iat, self.clock_skew) {
                tracing::debug!(target: "teller.auth.jwt", error = %e, "Token iat validation failed");
                return Err(TokenError::IssuedInFuture.into());
            }
        }

        tracing::debug!(target: "teller.auth.jwt", "Token validated successfully");
        Ok(claims)
    }

    /// Verify signature and standard claims.
    fn verify(
        &self,
        token: &str,
        key: &DecodingKey,
        algorithm: Algorithm,
    ) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(algorithm);
        validation.leeway = self.clock_skew.as_secs();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);

        decode::<Claims>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(target: "teller.auth.jwt", error = %e, "Token verification failed");
                classify(e.kind())
            })
    }
}

/// Map a `jsonwebtoken` failure onto the token error taxonomy.
fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidRsaKey(_) | ErrorKind::Crypto(_) => {
            TokenError::SignatureInvalid
        }
        ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::MissingAlgorithm => TokenError::InvalidSigningMethod,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        ErrorKind::InvalidAudience => TokenError::InvalidAudience,
        ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
        ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
            "aud" => TokenError::InvalidAudience,
            "iss" => TokenError::InvalidIssuer,
            _ => TokenError::InvalidFormat,
        },
        _ => TokenError::InvalidFormat,
    }
}
