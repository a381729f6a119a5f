//! HTTP routes for the teller service.
//!
//! Defines the Axum router and application state.

use crate::auth::{AccessPolicy, Endpoint, KeySource, RoleTable, TokenValidator};
use crate::config::Config;
use crate::handlers;
use crate::middleware::{authorize, http_metrics_middleware, AuthState, EndpointGuard};
use axum::{
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Verification key source shared by every token validation.
    pub key_source: Arc<dyn KeySource>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe - public
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `/make-change` - GET, roles `customer` or `teller`
/// - `/panic` - POST, role `teller`
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
///
/// Authorization wraps the whole method router of each protected path, so
/// a request with the wrong method is authorized before it gets its 501.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let validator = Arc::new(TokenValidator::new(
        Arc::clone(&state.key_source),
        state.config.jwt_audience.clone(),
        state.config.jwt_issuer.clone(),
        state.config.jwt_clock_skew,
    ));
    let policy = Arc::new(AccessPolicy::new(
        RoleTable::standard(),
        state.config.role_match,
    ));
    let auth_state = Arc::new(AuthState {
        validator,
        policy,
        cookie_name: state.config.access_token_cookie.clone(),
    });

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let protected_routes = Router::new()
        .route(
            "/make-change",
            protect(
                get(handlers::make_change).fallback(handlers::get_only),
                &auth_state,
                Endpoint::MakeChange,
            ),
        )
        .route(
            "/panic",
            protect(
                post(handlers::call_police).fallback(handlers::post_only),
                &auth_state,
                Endpoint::Panic,
            ),
        );

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// Wrap every method of `route` in the authorization guard for `endpoint`.
fn protect(route: MethodRouter, auth: &Arc<AuthState>, endpoint: Endpoint) -> MethodRouter {
    route.layer(middleware::from_fn_with_state(
        EndpointGuard::new(Arc::clone(auth), endpoint),
        authorize,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
