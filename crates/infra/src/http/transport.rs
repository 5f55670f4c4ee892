//! reqwest-backed single-attempt HTTP transport

use std::time::Duration;

use async_trait::async_trait;
use console_core::HttpTransport;
use console_domain::constants::DEFAULT_USER_AGENT;
use console_domain::{ApiResponse, HttpMethod, PreparedRequest, TransportConfig, TransportError};
use reqwest::{Client as ReqwestClient, Method};
use tracing::debug;

use crate::errors::IntoTransportError;

/// Single-attempt [`HttpTransport`] over a shared reqwest client.
///
/// Never retries and never interprets statuses; `ResilientTransport` owns
/// both concerns.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// # Errors
    /// Returns `TransportError::InvalidRequest` if the TLS backend cannot be
    /// initialised.
    pub fn from_config(config: &TransportConfig) -> Result<Self, TransportError> {
        Self::builder().timeout(config.timeout()).user_agent(config.user_agent.clone()).build()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self.client.request(to_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response =
            builder.send().await.map_err(|err| err.into_transport(self.timeout))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|err| err.into_transport(self.timeout))?;

        debug!(status, bytes = body.len(), url = %request.url, "http exchange complete");
        Ok(ApiResponse::new(status, body.to_vec()))
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    user_agent: String,
    accept_invalid_certs: bool,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        let config = TransportConfig::default();
        Self {
            timeout: config.timeout(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: false,
        }
    }
}

impl ReqwestTransportBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Test-only helper to allow insecure TLS (e.g., self-signed certs).
    #[cfg(test)]
    pub fn accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    /// # Errors
    /// Returns `TransportError::InvalidRequest` if the client cannot be built.
    pub fn build(self) -> Result<ReqwestTransport, TransportError> {
        let mut builder = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .no_proxy();

        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|err| TransportError::InvalidRequest(format!("http client: {err}")))?;

        Ok(ReqwestTransport { client, timeout: self.timeout })
    }
}
