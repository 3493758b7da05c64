//! Mock identity provider serving a JWKS document.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the service fetches keys from, relative to the issuer.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// A wiremock server standing in for the Auth0 tenant.
///
/// The issuer is the server's base URL with a trailing slash, matching how
/// Auth0 spells its `iss` claim.
pub struct MockJwks {
    server: MockServer,
}

impl MockJwks {
    /// Start a server publishing `keys` in order.
    pub async fn start(keys: Vec<serde_json::Value>) -> Self {
        let jwks = Self::start_empty().await;
        jwks.publish(keys).await;
        jwks
    }

    /// Start a server with no JWKS route mounted (every fetch is a 404).
    pub async fn start_empty() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Replace whatever is mounted with a key set containing `keys`.
    pub async fn publish(&self, keys: Vec<serde_json::Value>) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "keys": keys })),
            )
            .mount(&self.server)
            .await;
    }

    /// Replace whatever is mounted with a failing JWKS route.
    pub async fn fail_with(&self, status: u16) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Replace whatever is mounted with a route returning `body` verbatim.
    pub async fn respond_raw(&self, body: &str) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Issuer URL (`AUTH0_DOMAIN`) for this tenant.
    pub fn issuer(&self) -> String {
        format!("{}/", self.server.uri())
    }

    /// Number of JWKS fetches received since the route was last replaced.
    pub async fn fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| {
                requests
                    .iter()
                    .filter(|request| request.url.path() == JWKS_PATH)
                    .count()
            })
            .unwrap_or(0)
    }
}
