//! Request and response types for the teller service.

use serde::{Deserialize, Serialize};

/// Query string of `GET /make-change`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeQuery {
    /// Amount in dollars as submitted. Kept raw so errors can echo it.
    pub total: Option<String>,
}

/// Number of coins of one denomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinCount {
    pub denomination: String,
    pub count: u64,
}

/// Response of `GET /make-change`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeResponse {
    pub message: String,
    pub change: Vec<CoinCount>,
}

/// Plain message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process serves requests.
    pub status: String,

    /// Verification keys currently cached.
    pub cached_keys: usize,
}
