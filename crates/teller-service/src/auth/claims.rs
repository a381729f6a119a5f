//! JWT claims structure.
//!
//! Contains the claims extracted from validated JWTs. The `sub` field is
//! redacted in Debug output to prevent exposure in logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A claim that identity providers emit either as a single string or as a
/// list of strings (`aud`, `roles`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// View the claim as a slice, in token order.
    pub fn as_slice(&self) -> &[String] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }
}

/// JWT Claims structure for validated tokens.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id) - redacted in Debug output.
    #[serde(default)]
    pub sub: String,

    /// Audience(s) the token was issued for.
    ///
    /// Absent values deserialize so that the validator, not serde, reports
    /// the missing claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<OneOrMany>,

    /// Issuer.
    #[serde(default)]
    pub iss: String,

    /// Expiration timestamp (Unix epoch seconds).
    #[serde(default)]
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not-before timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Application roles granted to the subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<OneOrMany>,
}

/// Custom Debug implementation that redacts the `sub` field.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("aud", &self.aud)
            .field("iss", &self.iss)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .field("roles", &self.roles)
            .finish()
    }
}

impl Claims {
    /// Roles in token order. Empty if the claim is absent.
    pub fn roles(&self) -> &[String] {
        self.roles.as_ref().map(OneOrMany::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn claims_from(json: &str) -> Claims {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_claims_debug_redacts_sub() {
        let claims = claims_from(
            r#"{"sub":"secret-user-id","aud":"app","iss":"idp","exp":1,"roles":["teller"]}"#,
        );

        let debug_str = format!("{:?}", claims);

        assert!(!debug_str.contains("secret-user-id"));
        assert!(debug_str.contains("[REDACTED]"));
        assert!(debug_str.contains("teller"));
    }

    #[test]
    fn test_roles_as_array_keeps_order() {
        let claims =
            claims_from(r#"{"aud":"app","iss":"idp","exp":1,"roles":["customer","teller"]}"#);

        assert_eq!(claims.roles(), ["customer", "teller"]);
    }

    #[test]
    fn test_roles_as_single_string() {
        let claims = claims_from(r#"{"aud":"app","iss":"idp","exp":1,"roles":"teller"}"#);

        assert_eq!(claims.roles(), ["teller"]);
    }

    #[test]
    fn test_roles_absent_is_empty() {
        let claims = claims_from(r#"{"aud":"app","iss":"idp","exp":1}"#);

        assert!(claims.roles().is_empty());
        assert!(claims.iat.is_none());
        assert!(claims.nbf.is_none());
        assert_eq!(claims.sub, "");
    }

    #[test]
    fn test_audience_list() {
        let claims = claims_from(r#"{"aud":["app","other"],"iss":"idp","exp":1}"#);

        assert_eq!(claims.aud.unwrap().as_slice(), ["app", "other"]);
    }

    #[test]
    fn test_missing_registered_claims_still_deserialize() {
        let claims = claims_from(r#"{"roles":["teller"]}"#);

        assert!(claims.aud.is_none());
        assert_eq!(claims.iss, "");
        assert_eq!(claims.exp, 0);
    }

    #[test]
    fn test_claims_serialization_omits_absent_fields() {
        let claims = claims_from(r#"{"sub":"u","aud":"app","iss":"idp","exp":1}"#);

        let json = serde_json::to_string(&claims).unwrap();
        assert!(!json.contains("roles"));
        assert!(!json.contains("nbf"));
        assert!(!json.contains("iat"));
    }
}
