//! Port interfaces for the client layer
//!
//! These traits define the boundaries between the orchestration logic in
//! this crate and the infrastructure that performs I/O.

use std::future::Future;

use async_trait::async_trait;
use console_domain::{ApiResponse, PreparedRequest, TransportError};
use thiserror::Error;

/// Trait for performing a single HTTP attempt
///
/// Implementations must not retry and must not interpret status codes: any
/// response that arrives, including 4xx/5xx, is returned as `Ok`. Only
/// failures to obtain a response are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &PreparedRequest) -> Result<ApiResponse, TransportError>;
}

/// Failure reported by a credential provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("credential refresh failed: {0}")]
pub struct RefreshError(pub String);

/// Trait for obtaining a replacement API key after the upstream rejects one
#[async_trait]
pub trait CredentialRefresher: Send + Sync {
    async fn refresh(&self) -> Result<String, RefreshError>;
}

/// Adapts an async closure into a [`CredentialRefresher`]
pub struct FnRefresher<F> {
    refresh: F,
}

impl<F> FnRefresher<F> {
    pub fn new(refresh: F) -> Self {
        Self { refresh }
    }
}

#[async_trait]
impl<F, Fut> CredentialRefresher for FnRefresher<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, RefreshError>> + Send,
{
    async fn refresh(&self) -> Result<String, RefreshError> {
        (self.refresh)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fn_refresher_forwards_closure_result() {
        let ok = FnRefresher::new(|| async { Ok::<_, RefreshError>("key_0987654321".to_string()) });
        assert_eq!(ok.refresh().await, Ok("key_0987654321".to_string()));

        let failing = FnRefresher::new(|| async { Err(RefreshError("session revoked".into())) });
        let err = failing.refresh().await.unwrap_err();
        assert_eq!(err.to_string(), "credential refresh failed: session revoked");
    }
}
