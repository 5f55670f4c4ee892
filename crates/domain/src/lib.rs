//! # Console Domain
//!
//! Data types for the merchant console's API client layer.
//!
//! This crate contains:
//! - Auth context and derived request headers
//! - Request descriptors, raw responses and freshness-tagged results
//! - Error taxonomy and the `Result` alias
//! - Configuration structures and policy constants
//!
//! ## Architecture
//! - No dependencies on other console crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
