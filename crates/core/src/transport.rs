//! Resilient transport: hard timeout plus bounded linear retry
//!
//! Only transport-level failures (timeouts, connection failures) are
//! retried. Any HTTP response, including 4xx/5xx, ends the loop and is
//! handed back; interpreting statuses is the facade's job.
//!
//! Per call: `Attempting(n) -> Done` on a response, `Attempting(n) ->
//! Attempting(n + 1)` on a transient failure while `n <= max_retries`,
//! otherwise `Failed` with [`TransportError::RetriesExhausted`].

use std::sync::Arc;
use std::time::Duration;

use console_domain::{ApiResponse, PreparedRequest, TransportConfig, TransportError};
use tracing::{debug, warn};

use crate::ports::HttpTransport;

/// Timeout and retry bounds for [`ResilientTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Retry `n` waits `base_delay * n`
    pub base_delay: Duration,
    /// Hard limit for each attempt
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TransportConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
            timeout: config.timeout(),
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry)
    }
}

/// Wraps a single-attempt [`HttpTransport`] with timeout and retry
#[derive(Clone)]
pub struct ResilientTransport {
    inner: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
}

impl ResilientTransport {
    pub fn new(inner: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute the request, retrying transient failures.
    ///
    /// Dropping the returned future cancels the attempt in progress.
    ///
    /// # Errors
    /// Non-transient failures are returned as-is; transient failures that
    /// outlast the retry bound become `RetriesExhausted`.
    pub async fn execute(&self, request: &PreparedRequest) -> Result<ApiResponse, TransportError> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        loop {
            debug!(attempt, method = request.method.as_str(), url = %request.url, "sending request");

            let result = match tokio::time::timeout(self.policy.timeout, self.inner.send(request)).await
            {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(self.policy.timeout)),
            };

            match result {
                Ok(response) => {
                    debug!(attempt, status = response.status, url = %request.url, "received response");
                    return Ok(response);
                }
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        attempt,
                        delay_ms = millis(delay),
                        error = %err,
                        url = %request.url,
                        "transient transport failure, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(err) if err.is_transient() => {
                    warn!(attempts = attempt, error = %err, url = %request.url, "transport retries exhausted");
                    return Err(TransportError::RetriesExhausted { attempts: attempt, last: Box::new(err) });
                }
                Err(err) => {
                    debug!(error = %err, url = %request.url, "non-retryable transport failure");
                    return Err(err);
                }
            }
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use console_domain::HttpMethod;
    use parking_lot::Mutex;

    use super::*;

    /// Replays a fixed script of attempt outcomes.
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
        calls: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<ApiResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self { script: Mutex::new(script.into()), calls: AtomicU32::new(0) })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, _request: &PreparedRequest) -> Result<ApiResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::ConnectionFailed("script exhausted".into())))
        }
    }

    /// Never answers.
    struct HangingTransport;

    #[async_trait]
    impl HttpTransport for HangingTransport {
        async fn send(&self, _request: &PreparedRequest) -> Result<ApiResponse, TransportError> {
            futures::future::pending().await
        }
    }

    fn request() -> PreparedRequest {
        PreparedRequest {
            method: HttpMethod::Get,
            url: "https://sandbox.example.io/payments/list".into(),
            headers: Vec::new(),
            body: None,
        }
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(max_retries)
            .with_base_delay(Duration::from_millis(5))
            .with_timeout(Duration::from_secs(1))
    }

    fn reset() -> Result<ApiResponse, TransportError> {
        Err(TransportError::ConnectionFailed("connection reset".into()))
    }

    #[tokio::test]
    async fn two_failures_then_success_within_bound_of_two() {
        let inner = ScriptedTransport::new(vec![reset(), reset(), Ok(ApiResponse::new(200, "[]"))]);
        let transport = ResilientTransport::new(inner.clone(), policy(2));

        let response = transport.execute(&request()).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn same_sequence_with_bound_of_one_exhausts_retries() {
        let inner = ScriptedTransport::new(vec![reset(), reset(), Ok(ApiResponse::new(200, "[]"))]);
        let transport = ResilientTransport::new(inner.clone(), policy(1));

        let err = transport.execute(&request()).await.unwrap_err();

        match err {
            TransportError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, TransportError::ConnectionFailed(_)));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test]
    async fn http_error_statuses_are_not_retried() {
        for status in [401, 403, 404, 500, 503] {
            let inner = ScriptedTransport::new(vec![Ok(ApiResponse::new(status, "{}"))]);
            let transport = ResilientTransport::new(inner.clone(), policy(2));

            let response = transport.execute(&request()).await.unwrap();

            assert_eq!(response.status, status);
            assert_eq!(inner.calls(), 1);
        }
    }

    #[tokio::test]
    async fn invalid_request_is_not_retried() {
        let inner =
            ScriptedTransport::new(vec![Err(TransportError::InvalidRequest("bad url".into()))]);
        let transport = ResilientTransport::new(inner.clone(), policy(2));

        let err = transport.execute(&request()).await.unwrap_err();

        assert!(matches!(err, TransportError::InvalidRequest(_)));
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn each_attempt_is_bounded_by_the_timeout() {
        let transport = ResilientTransport::new(
            Arc::new(HangingTransport),
            policy(1).with_timeout(Duration::from_millis(20)),
        );

        let err = transport.execute(&request()).await.unwrap_err();

        match err {
            TransportError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert_eq!(*last, TransportError::Timeout(Duration::from_millis(20)));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[test]
    fn logged_delay_saturates_instead_of_truncating() {
        assert_eq!(millis(Duration::from_millis(2000)), 2000);
        assert_eq!(millis(Duration::MAX), u64::MAX);
        assert_eq!(policy(2).with_base_delay(Duration::MAX).delay_for(3), Duration::MAX);
    }

    #[test]
    fn delay_grows_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.timeout, Duration::from_secs(15));
    }
}
