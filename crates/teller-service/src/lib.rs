//! Teller Service Library
//!
//! A cashier-style coin change API behind role-checked JWT authorization.
//!
//! Every protected request passes through the authorization pipeline:
//!
//! ```text
//! middleware::auth -> auth::jwt -> auth::public_key -> auth::access -> handlers/*.rs
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `auth` - Key provider, token validator, access decisions
//! - `middleware` - Authorization and HTTP metrics middleware
//! - `handlers` - HTTP request handlers
//! - `services` - Coin change computation
//! - `models` - Request and response types
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
