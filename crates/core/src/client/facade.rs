//! Client facade: the single entry point UI collaborators call
//!
//! Composes header building, the resilient transport, single-flight key
//! refresh and the response cache into one `call`.

use std::sync::Arc;

use console_domain::constants::{HEADER_MERCHANT_ID, HEADER_PROFILE_ID, HEADER_REQUEST_ID};
use console_domain::{
    ApiResource, ApiResponse, AuthError, AuthHeaders, CachePolicy, ClientConfig, ClientError,
    Fetched, PreparedRequest, RequestDescriptor, Result, TransportError,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, field, info, instrument, warn, Span};
use uuid::Uuid;

use crate::auth::{AuthContextStore, RequestAuthenticator, TokenRefreshCoordinator};
use crate::cache::{CacheKey, CacheStats, ResponseCache};
use crate::ports::{CredentialRefresher, HttpTransport};
use crate::time::{Clock, SystemClock};
use crate::transport::{ResilientTransport, RetryPolicy};

/// Authenticated, retrying, caching client for the upstream API
pub struct ClientFacade {
    base_url: String,
    store: Arc<AuthContextStore>,
    authenticator: RequestAuthenticator,
    transport: ResilientTransport,
    refresh: Arc<TokenRefreshCoordinator>,
    cache: Arc<ResponseCache<Value>>,
}

impl ClientFacade {
    pub fn builder() -> ClientFacadeBuilder {
        ClientFacadeBuilder::default()
    }

    /// Perform `descriptor` on behalf of `resource_key`.
    ///
    /// `resource_key` names the logical resource for caching; entries are
    /// further keyed by method, path, merchant, profile and parameters.
    ///
    /// # Errors
    /// Context errors fail before any I/O and never fall back to the cache.
    /// Other terminal failures are returned only if no cached entry exists
    /// (or the policy is `Bypass`).
    #[instrument(
        skip(self, descriptor),
        fields(
            resource = resource_key,
            method = descriptor.method.as_str(),
            path = %descriptor.path,
            request_id = field::Empty,
        )
    )]
    pub async fn call(
        &self,
        resource_key: &str,
        descriptor: &RequestDescriptor,
    ) -> Result<Fetched<Value>> {
        let request_id = Uuid::now_v7();
        Span::current().record("request_id", field::display(request_id));

        let epoch = self.store.epoch();
        let headers = self.authenticator.build_headers()?;
        let key = cache_key(resource_key, descriptor, &headers);

        if descriptor.cache_policy == CachePolicy::CacheFirst {
            if let Some(hit) = self.cache.get_fresh(&key) {
                debug!(key = %key, "served from cache without fetching");
                return Ok(hit.into_fetched());
            }
        }

        match self.fetch_live(descriptor, headers, request_id).await {
            Ok(data) => {
                if descriptor.cache_policy != CachePolicy::Bypass {
                    self.remember(epoch, key, &data);
                }
                Ok(Fetched::fresh(data))
            }
            Err(err) => self.fall_back(&key, descriptor.cache_policy, err),
        }
    }

    pub async fn get(&self, resource_key: &str, path: &str) -> Result<Fetched<Value>> {
        self.call(resource_key, &RequestDescriptor::get(path)).await
    }

    pub async fn post(&self, resource_key: &str, path: &str, body: Value) -> Result<Fetched<Value>> {
        self.call(resource_key, &RequestDescriptor::post(path, body)).await
    }

    /// Fetch the list view of a catalogued resource for the current merchant.
    ///
    /// # Errors
    /// `MISSING_API_KEY` without a session, otherwise as [`Self::call`].
    pub async fn list(&self, resource: ApiResource) -> Result<Fetched<Value>> {
        let context = self.store.get().ok_or_else(AuthError::missing_api_key)?;
        let descriptor = resource.list_descriptor(&context.merchant_id);
        self.call(resource.key(), &descriptor).await
    }

    /// [`Self::call`] with the payload decoded into `T`.
    ///
    /// # Errors
    /// As [`Self::call`], plus `ClientError::Decode` if the payload does not
    /// fit `T`.
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        resource_key: &str,
        descriptor: &RequestDescriptor,
    ) -> Result<Fetched<T>> {
        self.call(resource_key, descriptor).await?.try_map(|data| {
            serde_json::from_value(data).map_err(|err| ClientError::Decode(err.to_string()))
        })
    }

    /// End the session: drop the context, any pending refresh and all
    /// cached responses.
    pub fn logout(&self) {
        self.store.clear();
        self.refresh.reset();
        self.cache.clear();
        info!("session cleared");
    }

    /// Drop every cached response for `resource_key`.
    pub fn invalidate(&self, resource_key: &str) -> usize {
        self.cache.invalidate_resource(resource_key)
    }

    pub fn store(&self) -> &Arc<AuthContextStore> {
        &self.store
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh.refresh_count()
    }

    async fn fetch_live(
        &self,
        descriptor: &RequestDescriptor,
        headers: AuthHeaders,
        request_id: Uuid,
    ) -> Result<Value> {
        let request = self.prepare(descriptor, &headers, request_id)?;
        let mut response = self.transport.execute(&request).await?;

        if response.status == 401 {
            debug!(url = %request.url, "api key rejected, refreshing");
            self.refresh.ensure_fresh_auth(headers.api_key()).await?;

            let headers = self.authenticator.build_headers()?;
            let retry = self.prepare(descriptor, &headers, request_id)?;
            response = self.transport.execute(&retry).await?;

            if response.status == 401 {
                let upstream = response.upstream_error();
                let message = upstream.describe(401);
                warn!(url = %retry.url, "api key rejected after refresh");
                let err = if upstream.mentions_permissions() {
                    AuthError::insufficient_permissions(message)
                } else {
                    AuthError::invalid_api_key(message)
                };
                return Err(err.with_status(401).into());
            }
        }

        interpret(response)
    }

    fn prepare(
        &self,
        descriptor: &RequestDescriptor,
        headers: &AuthHeaders,
        request_id: Uuid,
    ) -> Result<PreparedRequest> {
        let raw = format!("{}{}", self.base_url, descriptor.path);
        let mut url = url::Url::parse(&raw)
            .map_err(|err| TransportError::InvalidRequest(format!("{raw}: {err}")))?;
        if !descriptor.query.is_empty() {
            url.query_pairs_mut().extend_pairs(descriptor.query.iter());
        }

        let mut outbound: Vec<(String, String)> =
            headers.iter().map(|(name, value)| (name.to_string(), value.to_string())).collect();
        outbound.push((HEADER_REQUEST_ID.to_string(), request_id.to_string()));

        Ok(PreparedRequest {
            method: descriptor.method,
            url: url.into(),
            headers: outbound,
            body: descriptor.body.clone(),
        })
    }

    /// Cache `data` unless the session it was fetched under has ended.
    fn remember(&self, epoch: u64, key: CacheKey, data: &Value) {
        if self.store.epoch() == epoch {
            self.cache.put(key, data.clone());
        } else {
            debug!(key = %key, "session changed during fetch, not caching");
        }
    }

    fn fall_back(
        &self,
        key: &CacheKey,
        policy: CachePolicy,
        err: ClientError,
    ) -> Result<Fetched<Value>> {
        let context_error = matches!(&err, ClientError::Auth(auth) if auth.is_context_error());
        if policy == CachePolicy::Bypass || context_error {
            return Err(err);
        }

        match self.cache.get_fallback(key) {
            Some(hit) => {
                warn!(key = %key, error = %err, error_kind = err.label(), "live fetch failed, serving stale data");
                Ok(hit.into_fetched())
            }
            None => {
                debug!(key = %key, error_kind = err.label(), "live fetch failed with nothing cached");
                Err(err)
            }
        }
    }
}

/// Map a non-401 response to data or a terminal error.
fn interpret(response: ApiResponse) -> Result<Value> {
    if response.is_success() {
        return response.json();
    }

    let upstream = response.upstream_error();
    let message = upstream.describe(response.status);
    if response.status == 403 {
        return Err(AuthError::insufficient_permissions(message).into());
    }
    Err(ClientError::Http { status: response.status, code: upstream.code, message })
}

fn cache_key(resource_key: &str, descriptor: &RequestDescriptor, headers: &AuthHeaders) -> CacheKey {
    CacheKey::new(
        resource_key,
        format!(
            "{} {}|{}|{}|{}",
            descriptor.method.as_str(),
            descriptor.path,
            headers.get(HEADER_MERCHANT_ID).unwrap_or_default(),
            headers.get(HEADER_PROFILE_ID).unwrap_or_default(),
            descriptor.canonical_params(),
        ),
    )
}

/// Builder for [`ClientFacade`]
#[derive(Default)]
pub struct ClientFacadeBuilder {
    config: Option<ClientConfig>,
    store: Option<Arc<AuthContextStore>>,
    transport: Option<Arc<dyn HttpTransport>>,
    refresher: Option<Arc<dyn CredentialRefresher>>,
    retry_policy: Option<RetryPolicy>,
    clock: Option<Arc<dyn Clock>>,
}

impl ClientFacadeBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share an existing store; a fresh empty one is created otherwise.
    pub fn store(mut self, store: Arc<AuthContextStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn refresher(mut self, refresher: Arc<dyn CredentialRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Override the retry policy derived from the transport config.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// # Errors
    /// `ClientError::Config` if the config is missing or invalid, or no
    /// transport or refresher was supplied.
    pub fn build(self) -> Result<ClientFacade> {
        let config = self.config.ok_or_else(|| ClientError::Config("config not set".into()))?;
        config.validate()?;
        let transport =
            self.transport.ok_or_else(|| ClientError::Config("transport not set".into()))?;
        let refresher =
            self.refresher.ok_or_else(|| ClientError::Config("credential refresher not set".into()))?;

        let store = self.store.unwrap_or_default();
        let policy = self.retry_policy.unwrap_or_else(|| RetryPolicy::from_config(&config.transport));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        Ok(ClientFacade {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            authenticator: RequestAuthenticator::new(Arc::clone(&store)),
            transport: ResilientTransport::new(transport, policy),
            refresh: Arc::new(TokenRefreshCoordinator::new(Arc::clone(&store), refresher)),
            cache: Arc::new(ResponseCache::with_clock(&config.cache, clock)),
            store,
        })
    }
}
