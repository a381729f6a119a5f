//! HTTP middleware for the teller service.
//!
//! - `auth` - Authorization for protected routes
//! - `http_metrics` - Request metrics for every response

pub mod auth;
pub mod http_metrics;

pub use auth::{authorize, AuthState, ClaimsExt, EndpointGuard};
pub use http_metrics::http_metrics_middleware;
