//! Domain data types for the client layer

pub mod auth;
pub mod request;
pub mod resource;
pub mod response;

pub use auth::{validate_api_key, AuthContext, AuthHeaders};
pub use request::{CachePolicy, HttpMethod, PreparedRequest, RequestDescriptor};
pub use resource::ApiResource;
pub use response::{ApiResponse, Fetched, UpstreamError};
