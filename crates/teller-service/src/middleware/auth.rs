//! Authorization middleware for protected routes.
//!
//! `authorize` runs in front of every protected route:
//! 1. Extract a credential (bearer header first, then the session cookie)
//! 2. Validate the token
//! 3. Check the caller's roles against the route's [`Endpoint`]
//! 4. Inject the validated `Claims` into request extensions and continue
//!
//! Any failure short-circuits with an error response; the wrapped handler
//! never runs.

use crate::auth::{AccessPolicy, Claims, Endpoint, TokenValidator};
use crate::errors::{TellerError, TokenError};
use crate::observability::metrics::record_auth_decision;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::IntoResponse,
};
use cookie::Cookie;
use std::sync::Arc;
use tracing::instrument;

/// Shared state for the authorization middleware.
pub struct AuthState {
    /// Token validator with its key source.
    pub validator: Arc<TokenValidator>,

    /// Role requirements per endpoint.
    pub policy: Arc<AccessPolicy>,

    /// Name of the session cookie that may carry the token.
    pub cookie_name: String,
}

/// Per-route middleware state: the shared auth state plus the identity of
/// the endpoint the route serves.
#[derive(Clone)]
pub struct EndpointGuard {
    pub auth: Arc<AuthState>,
    pub endpoint: Endpoint,
}

impl EndpointGuard {
    pub fn new(auth: Arc<AuthState>, endpoint: Endpoint) -> Self {
        Self { auth, endpoint }
    }
}

/// Extract the raw token from the request.
///
/// An `Authorization` header wins over the cookie. A header that is present
/// but not `Bearer <token>` is rejected rather than falling back.
fn extract_credential<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Result<&'a str, TellerError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                tracing::debug!(target: "teller.middleware.auth", "Invalid Authorization header format");
                TellerError::InvalidToken(TokenError::InvalidFormat)
            })?;
        return Ok(token);
    }

    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == cookie_name && !c.value().is_empty())
        .and_then(|c| c.value_raw());

    from_cookie.ok_or_else(|| {
        tracing::debug!(target: "teller.middleware.auth", "No bearer token or session cookie");
        TellerError::CredentialMissing
    })
}

/// Authorization middleware for a single protected endpoint.
///
/// # Response
///
/// - 401 if the credential is missing, the token is invalid, or the role is denied
/// - 503 if the verification key cannot be obtained
/// - Otherwise the wrapped handler's response, with `Claims` in extensions
#[instrument(skip_all, name = "teller.middleware.auth", fields(endpoint = %guard.endpoint))]
pub async fn authorize(
    State(guard): State<EndpointGuard>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, TellerError> {
    let endpoint = guard.endpoint;

    let claims = match check(&guard, req.headers()).await {
        Ok(claims) => claims,
        Err(e) => {
            let (outcome, reason) = match &e {
                TellerError::CredentialMissing => ("denied", "no_credential"),
                TellerError::InvalidToken(token_error) => ("denied", token_error.label()),
                TellerError::RoleDenied => ("denied", "role_denied"),
                _ => ("unavailable", "key_unavailable"),
            };
            record_auth_decision(endpoint.name(), outcome, reason);
            tracing::info!(
                target: "teller.middleware.auth",
                status = e.status_code(),
                reason,
                "Request rejected"
            );
            return Err(e);
        }
    };

    record_auth_decision(endpoint.name(), "allowed", "none");
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

async fn check(guard: &EndpointGuard, headers: &HeaderMap) -> Result<Claims, TellerError> {
    let token = extract_credential(headers, &guard.auth.cookie_name)?;

    let claims = guard.auth.validator.validate(token).await?;

    if !guard.auth.policy.is_permitted(claims.roles(), guard.endpoint) {
        tracing::debug!(
            target: "teller.middleware.auth",
            roles = ?claims.roles(),
            "No permitted role in token"
        );
        return Err(TellerError::RoleDenied);
    }

    Ok(claims)
}

/// Extension trait for extracting claims from request.
pub trait ClaimsExt {
    /// Get the authenticated claims from request extensions.
    ///
    /// Returns `None` if the middleware was not applied to this request.
    fn claims(&self) -> Option<&Claims>;
}

impl<B> ClaimsExt for axum::extract::Request<B> {
    fn claims(&self) -> Option<&Claims> {
        self.extensions().get::<Claims>()
    }
}
