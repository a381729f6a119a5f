//! Authentication and authorization for the teller service.
//!
//! - [`public_key`]: fetches and caches the identity provider's RSA keys
//! - [`jwt`]: validates bearer tokens against those keys
//! - [`access`]: decides whether validated roles may reach an endpoint

pub mod access;
pub mod claims;
pub mod jwt;
pub mod public_key;

pub use access::{AccessPolicy, Endpoint, RoleMatch, RoleTable};
pub use claims::Claims;
pub use jwt::TokenValidator;
pub use public_key::{KeySource, PublicKeyClient};
