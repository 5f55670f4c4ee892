//! Credential refresher backed by the console's session endpoint
//!
//! POSTs the current merchant/profile (and the rejected key, as `api-key`)
//! to the configured endpoint and reads a replacement `api_key` from the
//! JSON reply.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use console_core::{AuthContextStore, CredentialRefresher, RefreshError};
use console_domain::constants::HEADER_API_KEY;
use console_domain::{TransportConfig, UpstreamError};
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::errors::IntoTransportError;

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    merchant_id: &'a str,
    profile_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    api_key: Option<String>,
}

/// [`CredentialRefresher`] that asks an HTTP endpoint for a new API key
pub struct EndpointCredentialRefresher {
    client: ReqwestClient,
    endpoint: Url,
    store: Arc<AuthContextStore>,
    timeout: Duration,
}

impl EndpointCredentialRefresher {
    /// # Errors
    /// Returns `RefreshError` if `endpoint` is not an absolute URL or the
    /// HTTP client cannot be built.
    pub fn new(
        endpoint: &str,
        store: Arc<AuthContextStore>,
        config: &TransportConfig,
    ) -> Result<Self, RefreshError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|err| RefreshError(format!("invalid refresh endpoint {endpoint}: {err}")))?;
        let client = ReqwestClient::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .no_proxy()
            .build()
            .map_err(|err| RefreshError(format!("http client: {err}")))?;

        Ok(Self { client, endpoint, store, timeout: config.timeout() })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl CredentialRefresher for EndpointCredentialRefresher {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn refresh(&self) -> Result<String, RefreshError> {
        let context =
            self.store.get().ok_or_else(|| RefreshError("no session to refresh".into()))?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(HEADER_API_KEY, context.api_key.as_str())
            .json(&RefreshRequest {
                merchant_id: &context.merchant_id,
                profile_id: &context.profile_id,
            })
            .send()
            .await
            .map_err(|err| RefreshError(err.into_transport(self.timeout).to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| RefreshError(err.into_transport(self.timeout).to_string()))?;

        if !status.is_success() {
            let upstream = UpstreamError::from_body(&body);
            warn!(status = status.as_u16(), code = ?upstream.code, "session endpoint rejected refresh");
            return Err(RefreshError(format!(
                "session endpoint returned {}: {}",
                status.as_u16(),
                upstream.describe(status.as_u16())
            )));
        }

        let reply: RefreshResponse = serde_json::from_slice(&body)
            .map_err(|err| RefreshError(format!("malformed refresh response: {err}")))?;
        let api_key = reply
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| RefreshError("refresh response carried no api_key".into()))?;

        debug!("session endpoint issued a new api key");
        Ok(api_key)
    }
}
