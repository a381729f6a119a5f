//! `/make-change` handlers.

use crate::errors::TellerError;
use crate::models::{ChangeQuery, ChangeResponse};
use crate::services::change;
use axum::{extract::Query, Json};
use tracing::instrument;

/// Handler for GET /make-change?total=<dollars>
///
/// # Response
///
/// - 200 with the message and per-denomination counts (zeros included)
/// - 400 if `total` is missing or not a non-negative decimal
#[instrument(skip_all, name = "teller.handlers.change")]
pub async fn make_change(
    Query(query): Query<ChangeQuery>,
) -> Result<Json<ChangeResponse>, TellerError> {
    let raw = query.total.unwrap_or_default();

    let cents = change::parse_total(&raw).map_err(|e| {
        tracing::debug!(target: "teller.handlers.change", total = %raw, "Rejected total");
        e
    })?;

    let change = change::make_change(cents);
    let message = change::describe(&change);

    tracing::debug!(target: "teller.handlers.change", cents, "Change computed");
    Ok(Json(ChangeResponse { message, change }))
}

/// Any other method on /make-change.
pub async fn get_only() -> TellerError {
    TellerError::MethodNotSupported("Only GET method is supported.".to_string())
}
