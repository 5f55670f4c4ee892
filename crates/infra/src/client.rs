//! Production wiring of the client facade

use std::sync::Arc;

use console_core::{AuthContextStore, ClientFacade, CredentialRefresher};
use console_domain::{ClientConfig, ClientError, Result};
use tracing::info;

use crate::auth::EndpointCredentialRefresher;
use crate::config;
use crate::http::ReqwestTransport;

/// [`ClientFacade`] backed by reqwest, plus the config it was built from
pub struct ConsoleClient {
    facade: ClientFacade,
    config: ClientConfig,
}

impl ConsoleClient {
    /// Wire a client from `config`.
    ///
    /// Uses `refresher` when given; otherwise the config must name a
    /// `refresh_endpoint`, which is called through
    /// [`EndpointCredentialRefresher`].
    ///
    /// # Errors
    /// Returns `ClientError::Config` for an invalid config, a missing
    /// credential source, or an HTTP client that cannot be built.
    pub fn from_config(
        config: ClientConfig,
        store: Arc<AuthContextStore>,
        refresher: Option<Arc<dyn CredentialRefresher>>,
    ) -> Result<Self> {
        config.validate()?;

        let refresher = match refresher {
            Some(refresher) => refresher,
            None => {
                let endpoint = config.refresh_endpoint.as_deref().ok_or_else(|| {
                    ClientError::Config(
                        "no credential refresher supplied and refresh_endpoint not set".into(),
                    )
                })?;
                let refresher =
                    EndpointCredentialRefresher::new(endpoint, Arc::clone(&store), &config.transport)
                        .map_err(|err| ClientError::Config(err.to_string()))?;
                Arc::new(refresher) as Arc<dyn CredentialRefresher>
            }
        };

        let transport = ReqwestTransport::from_config(&config.transport)
            .map_err(|err| ClientError::Config(err.to_string()))?;

        let facade = ClientFacade::builder()
            .config(config.clone())
            .store(store)
            .transport(Arc::new(transport))
            .refresher(refresher)
            .build()?;

        info!(
            base_url = %config.base_url,
            timeout_secs = config.transport.timeout_secs,
            max_retries = config.transport.max_retries,
            cache_ttl_secs = config.cache.ttl_secs,
            "console client ready"
        );
        Ok(Self { facade, config })
    }

    /// [`config::load`] then [`Self::from_config`] with an empty session.
    ///
    /// # Errors
    /// As [`config::load`] and [`Self::from_config`].
    pub fn from_env() -> Result<Self> {
        Self::from_config(config::load()?, Arc::new(AuthContextStore::new()), None)
    }

    pub fn facade(&self) -> &ClientFacade {
        &self.facade
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn into_facade(self) -> ClientFacade {
        self.facade
    }
}

#[cfg(test)]
mod tests {
    use console_core::{FnRefresher, RefreshError};

    use super::*;

    #[test]
    fn requires_a_credential_source() {
        let result = ConsoleClient::from_config(
            ClientConfig::new("https://sandbox.example.io"),
            Arc::new(AuthContextStore::new()),
            None,
        );

        let err = result.err().unwrap();
        assert!(err.to_string().contains("refresh_endpoint"));
    }

    #[test]
    fn builds_with_endpoint_refresher() {
        let mut config = ClientConfig::new("https://sandbox.example.io");
        config.refresh_endpoint = Some("https://sandbox.example.io/user/session/refresh".into());

        let client =
            ConsoleClient::from_config(config, Arc::new(AuthContextStore::new()), None).unwrap();

        assert_eq!(client.config().base_url, "https://sandbox.example.io");
        assert!(!client.facade().store().is_established());
    }

    #[test]
    fn supplied_refresher_wins() {
        let refresher: Arc<dyn CredentialRefresher> =
            Arc::new(FnRefresher::new(|| async { Err::<String, _>(RefreshError("unused".into())) }));

        let client = ConsoleClient::from_config(
            ClientConfig::new("https://sandbox.example.io"),
            Arc::new(AuthContextStore::new()),
            Some(refresher),
        );

        assert!(client.is_ok());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = ConsoleClient::from_config(
            ClientConfig::new(" "),
            Arc::new(AuthContextStore::new()),
            None,
        );
        assert!(matches!(result.err(), Some(ClientError::Config(_))));
    }
}
