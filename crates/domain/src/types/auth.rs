//! Authentication context and the headers derived from it

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    HEADER_API_KEY, HEADER_MERCHANT_ID, HEADER_PROFILE_ID, HEADER_PUBLISHABLE_KEY,
    MIN_API_KEY_LENGTH,
};
use crate::errors::AuthError;

/// Credential and identity bundle required to call the upstream API
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub merchant_id: String,
    pub profile_id: String,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publishable_key: Option<String>,
}

impl AuthContext {
    pub fn new(
        merchant_id: impl Into<String>,
        profile_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            profile_id: profile_id.into(),
            api_key: api_key.into(),
            publishable_key: None,
        }
    }

    #[must_use]
    pub fn with_publishable_key(mut self, key: impl Into<String>) -> Self {
        self.publishable_key = Some(key.into());
        self
    }

    /// Check that every mandatory field is populated.
    ///
    /// # Errors
    /// Returns an `INVALID_CONTEXT` error naming the first offending field.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.merchant_id.trim().is_empty() {
            return Err(AuthError::invalid_context("merchant_id is empty"));
        }
        if self.profile_id.trim().is_empty() {
            return Err(AuthError::invalid_context("profile_id is empty"));
        }
        validate_api_key(&self.api_key)
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }
}

// Never print the keys.
impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("merchant_id", &self.merchant_id)
            .field("profile_id", &self.profile_id)
            .field("api_key", &"<redacted>")
            .field("publishable_key", &self.publishable_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Sanity check applied to every API key entering the store.
///
/// # Errors
/// Returns `INVALID_CONTEXT` for empty keys or keys shorter than
/// [`MIN_API_KEY_LENGTH`].
pub fn validate_api_key(api_key: &str) -> Result<(), AuthError> {
    if api_key.trim().is_empty() {
        return Err(AuthError::invalid_context("api_key is empty"));
    }
    if api_key.len() < MIN_API_KEY_LENGTH {
        return Err(AuthError::invalid_context(format!(
            "api_key is shorter than {MIN_API_KEY_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Transport-level projection of an [`AuthContext`]
///
/// Built fresh for every request.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    entries: Vec<(&'static str, String)>,
}

impl AuthHeaders {
    pub fn from_context(context: &AuthContext) -> Self {
        let mut entries = vec![
            (HEADER_API_KEY, context.api_key.clone()),
            (HEADER_MERCHANT_ID, context.merchant_id.clone()),
            (HEADER_PROFILE_ID, context.profile_id.clone()),
        ];
        if let Some(key) = context.publishable_key.as_ref().filter(|k| !k.is_empty()) {
            entries.push((HEADER_PUBLISHABLE_KEY, key.clone()));
        }
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The API key these headers carry.
    pub fn api_key(&self) -> &str {
        self.get(HEADER_API_KEY).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(key, value)| (*key, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter().map(|(key, _)| key)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AuthErrorKind;

    fn context() -> AuthContext {
        AuthContext::new("m1", "p1", "key_1234567890")
    }

    #[test]
    fn complete_context_validates() {
        assert!(context().is_complete());
    }

    #[test]
    fn short_or_missing_fields_are_invalid_context() {
        for ctx in [
            AuthContext::new("", "p1", "key_1234567890"),
            AuthContext::new("m1", " ", "key_1234567890"),
            AuthContext::new("m1", "p1", ""),
            AuthContext::new("m1", "p1", "short"),
        ] {
            let err = ctx.validate().unwrap_err();
            assert_eq!(err.kind, AuthErrorKind::InvalidContext);
        }
    }

    #[test]
    fn headers_omit_absent_publishable_key() {
        let headers = AuthHeaders::from_context(&context());
        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get("api-key"), Some("key_1234567890"));
        assert_eq!(headers.get("x-merchant-id"), Some("m1"));
        assert_eq!(headers.get(HEADER_PROFILE_ID), Some("p1"));
        assert_eq!(headers.get(HEADER_PUBLISHABLE_KEY), None);
    }

    #[test]
    fn headers_include_publishable_key_when_present() {
        let headers = AuthHeaders::from_context(&context().with_publishable_key("pk_snd_abc"));
        assert_eq!(headers.get(HEADER_PUBLISHABLE_KEY), Some("pk_snd_abc"));
        assert_eq!(headers.api_key(), "key_1234567890");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let ctx = context().with_publishable_key("pk_snd_abc");
        let rendered = format!("{ctx:?} {:?}", AuthHeaders::from_context(&ctx));
        assert!(!rendered.contains("key_1234567890"));
        assert!(!rendered.contains("pk_snd_abc"));
        assert!(rendered.contains("m1"));
    }
}
