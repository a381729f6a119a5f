//! HTTP request handlers for the teller service.

pub mod change;
pub mod health;
pub mod metrics;
pub mod panic;

pub use change::{get_only, make_change};
pub use health::health_check;
pub use metrics::metrics_handler;
pub use panic::{call_police, post_only};
