//! Role-based access decisions for protected endpoints.
//!
//! Each protected endpoint has a static set of permitted roles. A caller is
//! allowed when its roles intersect that set. Endpoints missing from the
//! table permit nobody.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Identity of a protected endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Coin change computation (`/make-change`).
    MakeChange,
    /// Alarm stub (`/panic`).
    Panic,
}

impl Endpoint {
    /// Stable name used in logs and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::MakeChange => "make_change",
            Endpoint::Panic => "panic",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which of the caller's roles take part in the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleMatch {
    /// Only the first role in the claim is considered.
    #[default]
    Primary,
    /// Any role in the claim may satisfy the requirement.
    Any,
}

impl FromStr for RoleMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(RoleMatch::Primary),
            "any" => Ok(RoleMatch::Any),
            other => Err(format!(
                "ROLE_MATCH must be 'primary' or 'any', got '{}'",
                other
            )),
        }
    }
}

/// Static mapping from endpoint to permitted roles.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    requirements: HashMap<Endpoint, Vec<String>>,
}

impl RoleTable {
    /// Empty table; every endpoint is denied.
    pub fn new() -> Self {
        Self::default()
    }

    /// The service's role requirements.
    ///
    /// - `/make-change`: `customer`, `teller`
    /// - `/panic`: `teller`
    pub fn standard() -> Self {
        Self::new()
            .with_endpoint(Endpoint::MakeChange, &["customer", "teller"])
            .with_endpoint(Endpoint::Panic, &["teller"])
    }

    /// Set the permitted roles for `endpoint`, replacing any previous entry.
    pub fn with_endpoint(mut self, endpoint: Endpoint, roles: &[&str]) -> Self {
        self.requirements.insert(
            endpoint,
            roles.iter().map(|role| role.to_string()).collect(),
        );
        self
    }

    /// Permitted roles for `endpoint`. Empty if the endpoint is unknown.
    pub fn required_roles(&self, endpoint: Endpoint) -> &[String] {
        self.requirements
            .get(&endpoint)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Decides whether a caller's roles grant access to an endpoint.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    table: RoleTable,
    role_match: RoleMatch,
}

impl AccessPolicy {
    pub fn new(table: RoleTable, role_match: RoleMatch) -> Self {
        Self { table, role_match }
    }

    /// Returns true if the roles in `role_claim` intersect the roles
    /// required by `endpoint`.
    pub fn is_permitted(&self, role_claim: &[String], endpoint: Endpoint) -> bool {
        let required = self.table.required_roles(endpoint);

        let considered = match self.role_match {
            RoleMatch::Primary => role_claim.get(..1).unwrap_or(&[]),
            RoleMatch::Any => role_claim,
        };

        considered.iter().any(|role| required.contains(role))
    }
}
