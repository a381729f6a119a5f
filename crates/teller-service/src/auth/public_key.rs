//! Public key client for fetching and caching token verification keys.
//!
//! Keys are fetched from the identity provider's public key endpoint
//! (`GET <url>?kid=<id>`, response `{"publicKey": "<PEM>"}`) and cached
//! per key identifier for the lifetime of the process.
//!
//! # Concurrency
//!
//! The cache is read under a shared lock. Misses take a fetch lock owned by
//! that `kid` and re-check the cache, so concurrent first requests for the
//! same `kid` produce a single network fetch while lookups for other key
//! identifiers proceed independently.
//!
//! # Failure
//!
//! A `kid` the identity provider answers 404 for is remembered as unknown
//! and never fetched again. Any other failed fetch fails the current request
//! only. Nothing is cached, so the next request retries.

use crate::errors::{TellerError, TokenError};
use crate::observability::metrics::record_key_fetch;
use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// Source of RSA verification keys, addressed by key identifier.
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Return the verification key for `kid`, fetching it if necessary.
    async fn get_verification_key(&self, kid: &str) -> Result<Arc<DecodingKey>, TellerError>;

    /// Number of keys currently held in memory.
    async fn cached_key_count(&self) -> usize;
}

/// Response body of the public key endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicKeyResponse {
    /// PEM-encoded RSA public key.
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

/// Upper bound on remembered unknown key identifiers.
const MAX_UNKNOWN_KIDS: usize = 1024;

/// Outcome of a completed fetch for one key identifier.
#[derive(Clone)]
enum CachedKey {
    Known(Arc<DecodingKey>),
    Unknown,
}

impl CachedKey {
    fn to_result(&self) -> Result<Arc<DecodingKey>, TellerError> {
        match self {
            CachedKey::Known(key) => Ok(Arc::clone(key)),
            CachedKey::Unknown => Err(TellerError::InvalidToken(TokenError::UnknownKeyId)),
        }
    }
}

/// HTTP-backed [`KeySource`] with a fetch-once cache.
pub struct PublicKeyClient {
    /// URL of the public key endpoint (without query string).
    key_service_url: String,

    /// HTTP client for fetching keys, carries the fetch timeout.
    http_client: reqwest::Client,

    /// Parsed keys and known-unknown identifiers. Never invalidated.
    cache: RwLock<HashMap<String, CachedKey>>,

    /// Number of `CachedKey::Unknown` entries in `cache`.
    unknown_count: AtomicUsize,

    /// One lock per `kid` with a fetch in flight.
    fetch_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PublicKeyClient {
    /// Create a new public key client.
    ///
    /// # Arguments
    ///
    /// * `key_service_url` - URL of the identity provider's public key endpoint
    /// * `timeout` - Upper bound for a single fetch
    pub fn new(key_service_url: String, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "teller.auth.keys", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            key_service_url,
            http_client,
            cache: RwLock::new(HashMap::new()),
            unknown_count: AtomicUsize::new(0),
            fetch_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn cached(&self, kid: &str) -> Option<CachedKey> {
        self.cache.read().await.get(kid).cloned()
    }

    async fn fetch_lock_for(&self, kid: &str) -> Arc<Mutex<()>> {
        let mut locks = self.fetch_locks.lock().await;
        Arc::clone(locks.entry(kid.to_string()).or_default())
    }

    /// Cache the outcome of a fetch. Transient failures are not cached.
    async fn remember(
        &self,
        kid: &str,
        result: Result<DecodingKey, TellerError>,
    ) -> Result<Arc<DecodingKey>, TellerError> {
        match result {
            Ok(key) => {
                let key = Arc::new(key);
                self.cache
                    .write()
                    .await
                    .insert(kid.to_string(), CachedKey::Known(Arc::clone(&key)));
                tracing::info!(target: "teller.auth.keys", "Public key cached");
                Ok(key)
            }
            Err(TellerError::InvalidToken(TokenError::UnknownKeyId)) => {
                if self.unknown_count.load(Ordering::Relaxed) < MAX_UNKNOWN_KIDS {
                    self.unknown_count.fetch_add(1, Ordering::Relaxed);
                    self.cache
                        .write()
                        .await
                        .insert(kid.to_string(), CachedKey::Unknown);
                }
                Err(TellerError::InvalidToken(TokenError::UnknownKeyId))
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch and parse the key for `kid` from the identity provider.
    #[instrument(skip(self), fields(kid = %kid))]
    async fn fetch_key(&self, kid: &str) -> Result<DecodingKey, TellerError> {
        tracing::debug!(target: "teller.auth.keys", url = %self.key_service_url, "Fetching public key");
        let start = Instant::now();

        let result = self.request_key(kid).await;

        let status = match &result {
            Ok(_) => "success",
            Err(TellerError::InvalidToken(_)) => "unknown_kid",
            Err(_) => "error",
        };
        record_key_fetch(status, start.elapsed());

        result
    }

    async fn request_key(&self, kid: &str) -> Result<DecodingKey, TellerError> {
        let response = self
            .http_client
            .get(&self.key_service_url)
            .query(&[("kid", kid)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "teller.auth.keys", error = %e, "Failed to fetch public key");
                TellerError::KeyUnavailable(format!("public key request failed: {}", e))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!(target: "teller.auth.keys", kid = %kid, "Identity provider does not know this key id");
            return Err(TellerError::InvalidToken(TokenError::UnknownKeyId));
        }

        if !response.status().is_success() {
            tracing::error!(
                target: "teller.auth.keys",
                status = %response.status(),
                "Public key endpoint returned error"
            );
            return Err(TellerError::KeyUnavailable(format!(
                "public key endpoint returned {}",
                response.status()
            )));
        }

        let body: PublicKeyResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "teller.auth.keys", error = %e, "Failed to parse public key response");
            TellerError::KeyUnavailable(format!("malformed public key response: {}", e))
        })?;

        DecodingKey::from_rsa_pem(body.public_key.as_bytes()).map_err(|e| {
            tracing::error!(target: "teller.auth.keys", error = %e, "Public key is not a valid RSA PEM");
            TellerError::KeyUnavailable(format!("invalid key material: {}", e))
        })
    }
}

#[async_trait]
impl KeySource for PublicKeyClient {
    /// Get a verification key by key ID.
    ///
    /// # Errors
    ///
    /// Returns `TellerError::KeyUnavailable` if the key cannot be fetched or parsed.
    /// Returns `TellerError::InvalidToken` if the identity provider does not know `kid`.
    #[instrument(skip(self), fields(kid = %kid))]
    async fn get_verification_key(&self, kid: &str) -> Result<Arc<DecodingKey>, TellerError> {
        if let Some(entry) = self.cached(kid).await {
            tracing::debug!(target: "teller.auth.keys", "Public key cache hit");
            return entry.to_result();
        }

        let lock = self.fetch_lock_for(kid).await;
        let _guard = lock.lock().await;

        // Another request may have filled the cache while we waited
        if let Some(entry) = self.cached(kid).await {
            return entry.to_result();
        }

        let result = self.fetch_key(kid).await;
        let result = self.remember(kid, result).await;
        self.fetch_locks.lock().await.remove(kid);
        result
    }

    async fn cached_key_count(&self) -> usize {
        self.cache
            .read()
            .await
            .values()
            .filter(|entry| matches!(entry, CachedKey::Known(_)))
            .count()
    }
}
