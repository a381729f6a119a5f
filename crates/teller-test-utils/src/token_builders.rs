//! Builder patterns for test data construction
//!
//! Provides a fluent API for creating test JWT claims.

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

/// Audience the test server is configured to expect.
pub const TEST_AUDIENCE: &str = "e9fdb985-9173-4e01-9d73-ac2d60d1dc8e";

/// Issuer the test server is configured to expect.
pub const TEST_ISSUER: &str = "http://localhost:9011";

/// Builder for creating test JWT claims
///
/// Defaults produce claims the test server accepts, minus roles.
///
/// # Example
/// ```rust,ignore
/// let claims = TestTokenBuilder::new()
///     .for_user("alice")
///     .with_roles(&["teller"])
///     .expires_in(3600)
///     .build();
/// ```
pub struct TestTokenBuilder {
    sub: String,
    aud: Value,
    iss: String,
    exp: i64,
    iat: i64,
    nbf: Option<i64>,
    roles: Option<Value>,
    omitted: Vec<String>,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-subject".to_string(),
            aud: json!(TEST_AUDIENCE),
            iss: TEST_ISSUER.to_string(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            nbf: None,
            roles: None,
            omitted: Vec::new(),
        }
    }

    /// Set the subject
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set the roles claim as an array
    pub fn with_roles(mut self, roles: &[&str]) -> Self {
        self.roles = Some(json!(roles));
        self
    }

    /// Set the roles claim as a single string
    pub fn with_role_string(mut self, role: &str) -> Self {
        self.roles = Some(json!(role));
        self
    }

    /// Set a single audience
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.aud = json!(audience);
        self
    }

    /// Set a list of audiences
    pub fn with_audiences(mut self, audiences: &[&str]) -> Self {
        self.aud = json!(audiences);
        self
    }

    /// Set the issuer
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.iss = issuer.to_string();
        self
    }

    /// Set expiration in seconds from now (negative for already expired)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Set not-before timestamp
    pub fn not_before(mut self, timestamp: i64) -> Self {
        self.nbf = Some(timestamp);
        self
    }

    /// Drop a claim from the output entirely
    pub fn without_claim(mut self, claim: &str) -> Self {
        self.omitted.push(claim.to_string());
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        let mut claims = Map::new();
        claims.insert("sub".to_string(), json!(self.sub));
        claims.insert("aud".to_string(), self.aud);
        claims.insert("iss".to_string(), json!(self.iss));
        claims.insert("exp".to_string(), json!(self.exp));
        claims.insert("iat".to_string(), json!(self.iat));
        if let Some(nbf) = self.nbf {
            claims.insert("nbf".to_string(), json!(nbf));
        }
        if let Some(roles) = self.roles {
            claims.insert("roles".to_string(), roles);
        }
        for claim in &self.omitted {
            claims.remove(claim);
        }
        Value::Object(claims)
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let claims = TestTokenBuilder::new().build();

        assert_eq!(claims["aud"], TEST_AUDIENCE);
        assert_eq!(claims["iss"], TEST_ISSUER);
        assert!(claims["exp"].as_i64().unwrap() > Utc::now().timestamp());
        assert!(claims.get("roles").is_none());
        assert!(claims.get("nbf").is_none());
    }

    #[test]
    fn test_roles_shapes() {
        let list = TestTokenBuilder::new().with_roles(&["teller", "customer"]).build();
        let single = TestTokenBuilder::new().with_role_string("teller").build();

        assert_eq!(list["roles"], json!(["teller", "customer"]));
        assert_eq!(single["roles"], json!("teller"));
    }

    #[test]
    fn test_without_claim() {
        let claims = TestTokenBuilder::new()
            .with_roles(&["teller"])
            .without_claim("iss")
            .without_claim("roles")
            .build();

        assert!(claims.get("iss").is_none());
        assert!(claims.get("roles").is_none());
        assert!(claims.get("aud").is_some());
    }

    #[test]
    fn test_expired() {
        let claims = TestTokenBuilder::new().expires_in(-60).build();
        assert!(claims["exp"].as_i64().unwrap() < Utc::now().timestamp());
    }
}
