//! Client constants
//!
//! Defaults for the resilient client layer. Every timing value here is a
//! policy knob and can be overridden through [`crate::ClientConfig`].

// Auth context validation
pub const MIN_API_KEY_LENGTH: usize = 10;

// Transport
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_USER_AGENT: &str = concat!("merchant-console/", env!("CARGO_PKG_VERSION"));

// Response cache
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_STALE_RETENTION_SECS: u64 = 3_600;

// Upstream header names
pub const HEADER_API_KEY: &str = "api-key";
pub const HEADER_MERCHANT_ID: &str = "X-Merchant-Id";
pub const HEADER_PROFILE_ID: &str = "X-Profile-Id";
pub const HEADER_PUBLISHABLE_KEY: &str = "X-Publishable-Key";
pub const HEADER_REQUEST_ID: &str = "X-Request-Id";
