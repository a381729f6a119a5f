//! Teller service configuration.
//!
//! Configuration is loaded from environment variables once at startup and
//! is read-only afterwards.

use crate::auth::access::RoleMatch;
use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default listen address (matches the port the service has always used).
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:9001";

/// Default key-distribution endpoint. `?kid=<id>` is appended per fetch.
pub const DEFAULT_KEY_SERVICE_URL: &str = "http://localhost:9011/api/jwt/public-key";

/// Default name of the session cookie that may carry the access token.
pub const DEFAULT_ACCESS_TOKEN_COOKIE: &str = "app.at";

/// Default timeout for a single public key fetch.
pub const DEFAULT_KEY_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Upper bound for the key fetch timeout.
pub const MAX_KEY_FETCH_TIMEOUT_SECONDS: u64 = 60;

/// Teller service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:9001").
    pub bind_address: String,

    /// Expected `aud` claim.
    pub jwt_audience: String,

    /// Expected `iss` claim.
    pub jwt_issuer: String,

    /// Public key endpoint on the identity provider.
    pub key_service_url: String,

    /// Timeout applied to each public key fetch.
    pub key_fetch_timeout: Duration,

    /// Leeway for `exp`/`nbf` and the future bound for `iat`.
    pub jwt_clock_skew: Duration,

    /// Cookie checked when no Authorization header is sent.
    pub access_token_cookie: String,

    /// How many of the caller's roles take part in the access decision.
    pub role_match: RoleMatch,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid key fetch timeout configuration: {0}")]
    InvalidKeyFetchTimeout(String),

    #[error("Invalid role match configuration: {0}")]
    InvalidRoleMatch(String),

    #[error("Invalid value for {0}: must not be empty")]
    EmptyValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwt_audience = required(vars, "JWT_AUDIENCE")?;
        let jwt_issuer = required(vars, "JWT_ISSUER")?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let key_service_url = vars
            .get("KEY_SERVICE_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_KEY_SERVICE_URL.to_string());

        let access_token_cookie = vars
            .get("ACCESS_TOKEN_COOKIE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ACCESS_TOKEN_COOKIE.to_string());
        if access_token_cookie.is_empty() {
            return Err(ConfigError::EmptyValue("ACCESS_TOKEN_COOKIE".to_string()));
        }

        let jwt_clock_skew = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value <= 0 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be positive, got {}",
                    value
                )));
            }

            if value > MAX_CLOCK_SKEW.as_secs() as i64 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }

            Duration::from_secs(value.unsigned_abs())
        } else {
            DEFAULT_CLOCK_SKEW
        };

        let key_fetch_timeout = if let Some(value_str) = vars.get("KEY_FETCH_TIMEOUT_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidKeyFetchTimeout(format!(
                    "KEY_FETCH_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 || value > MAX_KEY_FETCH_TIMEOUT_SECONDS {
                return Err(ConfigError::InvalidKeyFetchTimeout(format!(
                    "KEY_FETCH_TIMEOUT_SECONDS must be between 1 and {}, got {}",
                    MAX_KEY_FETCH_TIMEOUT_SECONDS, value
                )));
            }

            Duration::from_secs(value)
        } else {
            Duration::from_secs(DEFAULT_KEY_FETCH_TIMEOUT_SECONDS)
        };

        let role_match = match vars.get("ROLE_MATCH") {
            Some(value) => value.parse().map_err(ConfigError::InvalidRoleMatch)?,
            None => RoleMatch::default(),
        };

        Ok(Config {
            bind_address,
            jwt_audience,
            jwt_issuer,
            key_service_url,
            key_fetch_timeout,
            jwt_clock_skew,
            access_token_cookie,
            role_match,
        })
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    let value = vars
        .get(name)
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))?;

    if value.trim().is_empty() {
        return Err(ConfigError::EmptyValue(name.to_string()));
    }

    Ok(value.clone())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            (
                "JWT_AUDIENCE".to_string(),
                "e9fdb985-9173-4e01-9d73-ac2d60d1dc8e".to_string(),
            ),
            (
                "JWT_ISSUER".to_string(),
                "http://localhost:9011".to_string(),
            ),
        ])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.jwt_audience, "e9fdb985-9173-4e01-9d73-ac2d60d1dc8e");
        assert_eq!(config.jwt_issuer, "http://localhost:9011");
        assert_eq!(config.key_service_url, DEFAULT_KEY_SERVICE_URL);
        assert_eq!(config.key_fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.jwt_clock_skew, DEFAULT_CLOCK_SKEW);
        assert_eq!(config.access_token_cookie, "app.at");
        assert_eq!(config.role_match, RoleMatch::Primary);
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let mut vars = base_vars();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:9100".to_string());
        vars.insert(
            "KEY_SERVICE_URL".to_string(),
            "https://id.example.com/api/jwt/public-key".to_string(),
        );
        vars.insert("KEY_FETCH_TIMEOUT_SECONDS".to_string(), "3".to_string());
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "120".to_string());
        vars.insert("ACCESS_TOKEN_COOKIE".to_string(), "session".to_string());
        vars.insert("ROLE_MATCH".to_string(), "any".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9100");
        assert_eq!(
            config.key_service_url,
            "https://id.example.com/api/jwt/public-key"
        );
        assert_eq!(config.key_fetch_timeout, Duration::from_secs(3));
        assert_eq!(config.jwt_clock_skew, Duration::from_secs(120));
        assert_eq!(config.access_token_cookie, "session");
        assert_eq!(config.role_match, RoleMatch::Any);
    }

    #[test]
    fn test_from_vars_missing_audience() {
        let mut vars = base_vars();
        vars.remove("JWT_AUDIENCE");

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "JWT_AUDIENCE"));
    }

    #[test]
    fn test_from_vars_missing_issuer() {
        let mut vars = base_vars();
        vars.remove("JWT_ISSUER");

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "JWT_ISSUER"));
    }

    #[test]
    fn test_from_vars_rejects_blank_issuer() {
        let mut vars = base_vars();
        vars.insert("JWT_ISSUER".to_string(), "  ".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::EmptyValue(v)) if v == "JWT_ISSUER"));
    }

    #[test]
    fn test_from_vars_rejects_empty_cookie_name() {
        let mut vars = base_vars();
        vars.insert("ACCESS_TOKEN_COOKIE".to_string(), String::new());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::EmptyValue(v)) if v == "ACCESS_TOKEN_COOKIE"));
    }

    #[test]
    fn test_jwt_clock_skew_rejects_zero() {
        let mut vars = base_vars();
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must be positive"))
        );
    }

    #[test]
    fn test_jwt_clock_skew_rejects_too_large() {
        let mut vars = base_vars();
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "601".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must not exceed 600"))
        );
    }

    #[test]
    fn test_jwt_clock_skew_rejects_non_numeric() {
        let mut vars = base_vars();
        vars.insert(
            "JWT_CLOCK_SKEW_SECONDS".to_string(),
            "five-minutes".to_string(),
        );

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must be a valid integer"))
        );
    }

    #[test]
    fn test_key_fetch_timeout_rejects_zero_and_too_large() {
        for value in ["0", "61"] {
            let mut vars = base_vars();
            vars.insert("KEY_FETCH_TIMEOUT_SECONDS".to_string(), value.to_string());

            let result = Config::from_vars(&vars);
            assert!(
                matches!(result, Err(ConfigError::InvalidKeyFetchTimeout(ref msg)) if msg.contains("between 1 and 60")),
                "value {} should be rejected, got {:?}",
                value,
                result
            );
        }
    }

    #[test]
    fn test_key_fetch_timeout_rejects_non_numeric() {
        let mut vars = base_vars();
        vars.insert("KEY_FETCH_TIMEOUT_SECONDS".to_string(), "ten".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidKeyFetchTimeout(_))));
    }

    #[test]
    fn test_role_match_rejects_unknown_mode() {
        let mut vars = base_vars();
        vars.insert("ROLE_MATCH".to_string(), "all".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidRoleMatch(msg)) if msg.contains("all")));
    }
}
