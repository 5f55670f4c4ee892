//! Logging setup for binaries and tests embedding the client

mod logging;

pub use logging::{init_tracing, LogFormat};
