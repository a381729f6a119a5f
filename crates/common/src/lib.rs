//! Common utilities shared across Teller components.

#![warn(clippy::pedantic)]

/// Module for JWT utilities (header inspection, size limits, clock skew)
pub mod jwt;
