//! Liveness probe.

use crate::models::HealthResponse;
use crate::routes::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

/// Handler for GET /health
///
/// Public. Does not contact the identity provider; reports how many
/// verification keys are already cached.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        cached_keys: state.key_source.cached_key_count().await,
    })
}
