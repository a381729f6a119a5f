//! Observability for the teller service.
//!
//! Provides metrics definitions and recording helpers.

pub mod metrics;
