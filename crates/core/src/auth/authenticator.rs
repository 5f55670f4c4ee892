//! Builds outbound auth headers from the current context

use std::sync::Arc;

use console_domain::{AuthError, AuthHeaders};

use super::store::AuthContextStore;

/// Projects the store's context into request headers
///
/// Pure given the store's state: no I/O, safe to call for every attempt.
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    store: Arc<AuthContextStore>,
}

impl RequestAuthenticator {
    pub fn new(store: Arc<AuthContextStore>) -> Self {
        Self { store }
    }

    /// # Errors
    /// `MISSING_API_KEY` without a session; `INVALID_CONTEXT` if the session
    /// is incomplete.
    pub fn build_headers(&self) -> Result<AuthHeaders, AuthError> {
        let context = self.store.get().ok_or_else(AuthError::missing_api_key)?;
        context.validate()?;
        Ok(AuthHeaders::from_context(&context))
    }
}
