//! Shared fixtures for infra integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use console_core::{AuthContextStore, ClientFacade, CredentialRefresher, RetryPolicy};
use console_domain::{AuthContext, ClientConfig, TransportConfig};
use console_infra::{EndpointCredentialRefresher, ReqwestTransport};
use wiremock::MockServer;

pub const OLD_KEY: &str = "key_1234567890";
pub const NEW_KEY: &str = "key_0987654321";
pub const MERCHANT_ID: &str = "merchant_1";
pub const PROFILE_ID: &str = "pro_1";
pub const REFRESH_PATH: &str = "/user/session/refresh";

/// Facade wired to a mock upstream with real reqwest transport and the
/// endpoint refresher, tuned for fast retries.
pub struct TestConsole {
    pub facade: Arc<ClientFacade>,
    pub store: Arc<AuthContextStore>,
}

impl TestConsole {
    pub fn new(server: &MockServer) -> Self {
        Self::with_policy(server, fast_policy())
    }

    pub fn with_policy(server: &MockServer, policy: RetryPolicy) -> Self {
        Self::build(&server.uri(), &format!("{}{REFRESH_PATH}", server.uri()), policy)
    }

    pub fn build(base_url: &str, refresh_endpoint: &str, policy: RetryPolicy) -> Self {
        let store = Arc::new(
            AuthContextStore::with_context(AuthContext::new(MERCHANT_ID, PROFILE_ID, OLD_KEY))
                .expect("valid context"),
        );
        let refresher: Arc<dyn CredentialRefresher> = Arc::new(
            EndpointCredentialRefresher::new(
                refresh_endpoint,
                Arc::clone(&store),
                &TransportConfig::default(),
            )
            .expect("refresher"),
        );
        let transport = ReqwestTransport::builder().timeout(policy.timeout).build().expect("transport");

        let facade = ClientFacade::builder()
            .config(ClientConfig::new(base_url))
            .store(Arc::clone(&store))
            .transport(Arc::new(transport))
            .refresher(refresher)
            .retry_policy(policy)
            .build()
            .expect("facade");

        Self { facade: Arc::new(facade), store }
    }
}

pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::default()
        .with_base_delay(Duration::from_millis(10))
        .with_timeout(Duration::from_secs(2))
}
