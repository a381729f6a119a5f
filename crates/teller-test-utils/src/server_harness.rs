//! Test server harness for E2E testing
//!
//! Provides `TestTellerServer`, a real teller server bound to a random port
//! and wired to a wiremock identity provider.

use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use teller_service::auth::PublicKeyClient;
use teller_service::config::Config;
use teller_service::observability::metrics::init_metrics_recorder;
use teller_service::routes::{self, AppState};
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::token_builders::{TEST_AUDIENCE, TEST_ISSUER};

/// Path of the public key endpoint on the mocked identity provider.
pub const KEY_PATH: &str = "/api/jwt/public-key";

/// Global metrics handle for test servers
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics handle shared by every test server in the process.
///
/// The Prometheus recorder can only be installed once, so later callers
/// reuse the first handle.
pub fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder().unwrap_or_else(|_| {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .build_recorder()
                    .handle()
            })
        })
        .clone()
}

/// Mock answering `GET /api/jwt/public-key?kid=<kid>` with `public_key_pem`.
///
/// Returned unmounted so tests can add `.expect(n)` before mounting.
pub fn public_key_mock(kid: &str, public_key_pem: &str) -> Mock {
    Mock::given(method("GET"))
        .and(path(KEY_PATH))
        .and(query_param("kid", kid))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "publicKey": public_key_pem })),
        )
}

/// Environment for a test server whose identity provider is `key_server`.
pub fn test_vars(key_server: &MockServer) -> HashMap<String, String> {
    HashMap::from([
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ("JWT_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
        ("JWT_ISSUER".to_string(), TEST_ISSUER.to_string()),
        (
            "KEY_SERVICE_URL".to_string(),
            format!("{}{}", key_server.uri(), KEY_PATH),
        ),
        ("KEY_FETCH_TIMEOUT_SECONDS".to_string(), "2".to_string()),
        ("JWT_CLOCK_SKEW_SECONDS".to_string(), "60".to_string()),
    ])
}

/// Build the real router for `config` with a fresh key cache.
///
/// For `tower::ServiceExt::oneshot` tests that do not need a socket.
pub fn test_router(config: Config) -> Router {
    let key_source = Arc::new(PublicKeyClient::new(
        config.key_service_url.clone(),
        config.key_fetch_timeout,
    ));
    let state = Arc::new(AppState { config, key_source });
    routes::build_routes(state, test_metrics_handle())
}

/// Test harness for spawning the teller server in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() -> Result<()> {
///     let server = TestTellerServer::spawn().await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestTellerServer {
    addr: SocketAddr,
    key_server: MockServer,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestTellerServer {
    /// Spawn a server with the default test configuration.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(HashMap::new()).await
    }

    /// Spawn a server, overriding individual environment variables.
    ///
    /// The server will:
    /// - Start a wiremock identity provider (no mocks mounted)
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    pub async fn spawn_with_vars(
        overrides: HashMap<String, String>,
    ) -> Result<Self, anyhow::Error> {
        let key_server = MockServer::start().await;

        let mut vars = test_vars(&key_server);
        vars.extend(overrides);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let app = test_router(config.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            key_server,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// The mocked identity provider. Mount key mocks here.
    pub fn key_server(&self) -> &MockServer {
        &self.key_server
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestTellerServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
