//! In-process Jokes API servers for end-to-end tests.
//!
//! [`TestJokeServer`] runs the production router on an ephemeral port,
//! pointed at a [`MockJwks`] issuer.

use crate::jwks_mock::MockJwks;
use crate::keys::TEST_AUDIENCE;
use joke_service::config::Config;
use joke_service::observability::metrics::init_metrics_recorder;
use joke_service::routes::{self, AppState};
use joke_service::services::JokeStore;
use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Global metrics handle for test servers; the recorder installs once per process.
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics handle shared by every test server in this process.
pub fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the Jokes API in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_ping() -> Result<()> {
///     let jwks = MockJwks::start(vec![]).await;
///     let server = TestJokeServer::spawn(&jwks).await?;
///
///     let response = reqwest::get(format!("{}/api/", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestJokeServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    handle: JoinHandle<()>,
}

impl TestJokeServer {
    /// Spawn a server trusting `jwks` as its identity provider, with
    /// `TEST_AUDIENCE` and default settings.
    pub async fn spawn(jwks: &MockJwks) -> Result<Self, anyhow::Error> {
        Self::spawn_with(&jwks.issuer(), HashMap::new()).await
    }

    /// Spawn a server for `issuer`, with extra environment overrides
    /// (e.g. `JWKS_CACHE_TTL_SECONDS`).
    ///
    /// The server listens on an ephemeral loopback port until dropped.
    pub async fn spawn_with(
        issuer: &str,
        overrides: HashMap<&str, &str>,
    ) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            ("AUTH0_API_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
            ("AUTH0_DOMAIN".to_string(), issuer.to_string()),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "2".to_string()),
        ]);
        for (name, value) in overrides {
            vars.insert(name.to_string(), value.to_string());
        }

        let config = Config::from_vars(&vars).context("test config rejected")?;

        let state = Arc::new(AppState {
            config,
            jokes: Arc::new(JokeStore::seeded()),
        });

        let app = routes::build_routes(state.clone(), test_metrics_handle());

        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .context("binding test listener")?;
        let addr = listener.local_addr().context("reading test listener address")?;

        let handle = tokio::spawn(async move {
            let service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, service).await {
                eprintln!("test server stopped: {e}");
            }
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// `http://127.0.0.1:<port>`, without a trailing slash.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The joke store behind the server, for asserting on state directly.
    pub fn jokes(&self) -> &JokeStore {
        &self.state.jokes
    }

    /// Configuration the server was built from.
    pub fn config(&self) -> &Config {
        &self.state.config
    }
}

impl Drop for TestJokeServer {
    fn drop(&mut self) {
        // Abort the HTTP server task so the port is released when the test ends
        self.handle.abort();
    }
}
