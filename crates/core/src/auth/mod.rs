//! Session state, header building and API key refresh

pub mod authenticator;
pub mod refresh;
pub mod store;

pub use authenticator::RequestAuthenticator;
pub use refresh::TokenRefreshCoordinator;
pub use store::AuthContextStore;
