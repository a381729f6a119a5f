//! `/panic` handlers.

use crate::errors::TellerError;
use crate::middleware::ClaimsExt;
use crate::models::MessageResponse;
use axum::{extract::Request, Json};

/// Handler for POST /panic
///
/// Stub alarm. Only tellers reach this handler.
#[tracing::instrument(skip_all, name = "teller.handlers.panic")]
pub async fn call_police(request: Request) -> Json<MessageResponse> {
    if let Some(claims) = request.claims() {
        tracing::warn!(target: "teller.handlers.panic", roles = ?claims.roles(), "Panic button pressed");
    }

    Json(MessageResponse {
        message: "We've called the police!".to_string(),
    })
}

/// Any other method on /panic.
pub async fn post_only() -> TellerError {
    TellerError::MethodNotSupported("Only POST method is supported.".to_string())
}
