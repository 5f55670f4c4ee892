//! # Console Infrastructure
//!
//! Infrastructure implementations of the `console-core` ports.
//!
//! This crate contains:
//! - reqwest-backed single-attempt HTTP transport
//! - Session-endpoint credential refresher
//! - Configuration loading (environment, TOML/JSON files)
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Implements traits defined in `console-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod auth;
pub mod client;
pub mod config;
pub mod http;
pub mod observability;

mod errors;

// Re-export commonly used items
pub use auth::EndpointCredentialRefresher;
pub use client::ConsoleClient;
pub use http::{ReqwestTransport, ReqwestTransportBuilder};
pub use observability::{init_tracing, LogFormat};
