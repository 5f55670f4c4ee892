//! # Console Core
//!
//! Resilient client logic for the payment console - no HTTP code.
//!
//! This crate contains:
//! - Session state and auth header building
//! - Single-flight API key refresh
//! - Timeout/retry over a single-attempt transport
//! - Response cache with stale fallback
//! - The client facade tying them together
//!
//! ## Architecture Principles
//! - Only depends on `console-domain`
//! - All I/O via the traits in [`ports`]
//! - Time via [`time::Clock`] so cache expiry is testable

pub mod auth;
pub mod cache;
pub mod client;
pub mod ports;
pub mod time;
pub mod transport;

pub use auth::{AuthContextStore, RequestAuthenticator, TokenRefreshCoordinator};
pub use cache::{CacheKey, CacheStats, ResponseCache};
pub use client::{ClientFacade, ClientFacadeBuilder};
pub use ports::{CredentialRefresher, FnRefresher, HttpTransport, RefreshError};
pub use time::{Clock, MockClock, SystemClock};
pub use transport::{ResilientTransport, RetryPolicy};
