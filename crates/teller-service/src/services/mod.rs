//! Business logic for the teller service.

pub mod change;
