//! Auth context store
//!
//! Holds the current session's credential bundle behind a lock. The store is
//! an ordinary value: create one per session scope and share it with
//! `Arc<AuthContextStore>`.
//!
//! Every `set` and `clear` starts a new *epoch*. The refresh coordinator
//! tags its in-flight refresh with the epoch it started in, so a refresh
//! that outlives its session is neither joined nor applied.

use console_domain::types::auth::validate_api_key;
use console_domain::{AuthContext, AuthError};
use parking_lot::RwLock;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Session {
    context: Option<AuthContext>,
    epoch: u64,
}

/// Thread-safe holder of the current [`AuthContext`]
#[derive(Debug, Default)]
pub struct AuthContextStore {
    session: RwLock<Session>,
}

impl AuthContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with an established session.
    ///
    /// # Errors
    /// Returns `INVALID_CONTEXT` if the context is incomplete.
    pub fn with_context(context: AuthContext) -> Result<Self, AuthError> {
        let store = Self::new();
        store.set(context)?;
        Ok(store)
    }

    /// Establish a session, replacing any previous one.
    ///
    /// # Errors
    /// Returns `INVALID_CONTEXT` if a mandatory field is empty or the API key
    /// is too short; the previous state is left untouched.
    pub fn set(&self, context: AuthContext) -> Result<(), AuthError> {
        context.validate()?;

        let mut session = self.session.write();
        session.context = Some(context);
        session.epoch += 1;
        info!(epoch = session.epoch, "auth context established");
        Ok(())
    }

    pub fn get(&self) -> Option<AuthContext> {
        self.session.read().context.clone()
    }

    /// Current context together with the epoch it belongs to.
    pub fn snapshot(&self) -> (Option<AuthContext>, u64) {
        let session = self.session.read();
        (session.context.clone(), session.epoch)
    }

    pub fn epoch(&self) -> u64 {
        self.session.read().epoch
    }

    pub fn is_established(&self) -> bool {
        self.session.read().context.is_some()
    }

    /// Drop the session. Pending refreshes from the old epoch are abandoned.
    pub fn clear(&self) {
        let mut session = self.session.write();
        session.context = None;
        session.epoch += 1;
        info!(epoch = session.epoch, "auth context cleared");
    }

    /// Swap the API key in place; no other field changes.
    ///
    /// # Errors
    /// `MISSING_API_KEY` if no session exists, `INVALID_CONTEXT` if the new
    /// key fails the sanity check.
    pub fn replace_api_key(&self, new_key: &str) -> Result<(), AuthError> {
        validate_api_key(new_key)?;

        let mut session = self.session.write();
        let context = session.context.as_mut().ok_or_else(AuthError::missing_api_key)?;
        context.api_key = new_key.to_string();
        debug!("api key replaced");
        Ok(())
    }

    /// Like [`Self::replace_api_key`], but only if the session is still the
    /// one identified by `epoch`. Returns `Ok(false)` when it is not.
    pub(crate) fn replace_api_key_in_epoch(
        &self,
        epoch: u64,
        new_key: &str,
    ) -> Result<bool, AuthError> {
        validate_api_key(new_key)?;

        let mut session = self.session.write();
        if session.epoch != epoch {
            debug!(expected = epoch, current = session.epoch, "discarding key from stale session");
            return Ok(false);
        }
        let context = session.context.as_mut().ok_or_else(AuthError::missing_api_key)?;
        context.api_key = new_key.to_string();
        debug!(epoch, "api key replaced after refresh");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use console_domain::AuthErrorKind;

    use super::*;

    fn context() -> AuthContext {
        AuthContext::new("m1", "p1", "key_1234567890")
    }

    #[test]
    fn set_then_get_returns_context() {
        let store = AuthContextStore::new();
        assert!(store.get().is_none());

        store.set(context()).unwrap();
        assert_eq!(store.get(), Some(context()));
        assert!(store.is_established());
    }

    #[test]
    fn incomplete_context_leaves_previous_state() {
        let store = AuthContextStore::with_context(context()).unwrap();
        let epoch = store.epoch();

        for bad in [
            AuthContext::new("", "p1", "key_1234567890"),
            AuthContext::new("m2", "", "key_1234567890"),
            AuthContext::new("m2", "p2", "tiny"),
        ] {
            let err = store.set(bad).unwrap_err();
            assert_eq!(err.kind, AuthErrorKind::InvalidContext);
        }

        assert_eq!(store.get(), Some(context()));
        assert_eq!(store.epoch(), epoch);
    }

    #[test]
    fn incomplete_context_on_empty_store_stays_empty() {
        let store = AuthContextStore::new();
        assert!(store.set(AuthContext::new("m1", "p1", "")).is_err());
        assert!(store.get().is_none());
    }

    #[test]
    fn clear_resets_and_advances_epoch() {
        let store = AuthContextStore::with_context(context()).unwrap();
        let epoch = store.epoch();

        store.clear();

        assert!(store.get().is_none());
        assert!(store.epoch() > epoch);
    }

    #[test]
    fn replace_api_key_touches_only_the_key() {
        let store =
            AuthContextStore::with_context(context().with_publishable_key("pk_snd_1")).unwrap();
        let epoch = store.epoch();

        store.replace_api_key("key_0987654321").unwrap();

        let updated = store.get().unwrap();
        assert_eq!(updated.api_key, "key_0987654321");
        assert_eq!(updated.merchant_id, "m1");
        assert_eq!(updated.profile_id, "p1");
        assert_eq!(updated.publishable_key.as_deref(), Some("pk_snd_1"));
        assert_eq!(store.epoch(), epoch);
    }

    #[test]
    fn replace_api_key_requires_session_and_valid_key() {
        let store = AuthContextStore::new();
        assert_eq!(
            store.replace_api_key("key_0987654321").unwrap_err().kind,
            AuthErrorKind::MissingApiKey
        );

        store.set(context()).unwrap();
        assert_eq!(store.replace_api_key("short").unwrap_err().kind, AuthErrorKind::InvalidContext);
        assert_eq!(store.get().unwrap().api_key, "key_1234567890");
    }

    #[test]
    fn epoch_guarded_replace_ignores_stale_sessions() {
        let store = AuthContextStore::with_context(context()).unwrap();
        let epoch = store.epoch();
        store.set(AuthContext::new("m2", "p2", "key_abcdefghij")).unwrap();

        assert!(!store.replace_api_key_in_epoch(epoch, "key_0987654321").unwrap());
        assert_eq!(store.get().unwrap().api_key, "key_abcdefghij");

        assert!(store.replace_api_key_in_epoch(store.epoch(), "key_0987654321").unwrap());
        assert_eq!(store.get().unwrap().api_key, "key_0987654321");
    }
}
