//! Credential provider adapters

mod endpoint_refresher;

pub use endpoint_refresher::EndpointCredentialRefresher;
