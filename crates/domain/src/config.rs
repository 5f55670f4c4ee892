//! Configuration structures for the client layer
//!
//! Loading (environment variables, TOML/JSON files) lives in the infra
//! crate; this module only defines the shape and the defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_STALE_RETENTION_SECS, DEFAULT_USER_AGENT,
};
use crate::errors::{ClientError, Result};

/// Top-level client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the payment-orchestration API (e.g. `https://sandbox.example.io`)
    pub base_url: String,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub cache: CacheSettings,

    /// Session endpoint used to obtain a fresh API key after a 401
    #[serde(default)]
    pub refresh_endpoint: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            transport: TransportConfig::default(),
            cache: CacheSettings::default(),
            refresh_endpoint: None,
        }
    }

    /// Reject configurations that can never produce a working client.
    ///
    /// # Errors
    /// Returns `ClientError::Config` for an empty base URL or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::Config("base_url must not be empty".into()));
        }
        if self.transport.timeout_secs == 0 {
            return Err(ClientError::Config("transport.timeout_secs must be positive".into()));
        }
        if self.cache.ttl_secs == 0 {
            return Err(ClientError::Config("cache.ttl_secs must be positive".into()));
        }
        Ok(())
    }
}

/// Timeout and retry knobs for the resilient transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Hard timeout for a single attempt
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Delay unit; retry `n` waits `base_delay_ms * n`
    pub base_delay_ms: u64,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

/// Response cache knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Freshness window
    pub ttl_secs: u64,
    /// How long past the TTL an entry is kept around as a fallback
    pub stale_retention_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: DEFAULT_CACHE_TTL_SECS, stale_retention_secs: DEFAULT_STALE_RETENTION_SECS }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn stale_retention(&self) -> Duration {
        Duration::from_secs(self.stale_retention_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy_constants() {
        let config = ClientConfig::new("https://sandbox.example.io");
        assert_eq!(config.transport.timeout(), Duration::from_secs(15));
        assert_eq!(config.transport.max_retries, 2);
        assert_eq!(config.transport.base_delay(), Duration::from_millis(1000));
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            base_url = "https://sandbox.example.io"

            [transport]
            max_retries = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.transport.max_retries, 4);
        assert_eq!(config.transport.timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.cache, CacheSettings::default());
        assert_eq!(config.refresh_endpoint, None);
    }

    #[test]
    fn validate_rejects_unusable_values() {
        assert!(ClientConfig::new("  ").validate().is_err());

        let mut config = ClientConfig::new("https://sandbox.example.io");
        config.transport.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));
    }
}
