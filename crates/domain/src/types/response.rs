//! Raw upstream responses and what the client hands back to callers

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{ClientError, Result};

/// An HTTP response as received, before any status interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn json_body(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body; an empty body (204/205) decodes as JSON `null`.
    ///
    /// # Errors
    /// Returns `ClientError::Decode` if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_value(serde_json::Value::Null).map_err(|err| {
                ClientError::Decode(format!("empty body from status {}: {err}", self.status))
            });
        }
        serde_json::from_slice(&self.body).map_err(|err| ClientError::Decode(err.to_string()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn upstream_error(&self) -> UpstreamError {
        UpstreamError::from_body(&self.body)
    }
}

/// Error payload carried by 4xx/5xx responses
///
/// The upstream API reports `error_message`/`error_code` either at the top
/// level or nested under `error` as `message`/`code`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamError {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl UpstreamError {
    pub fn from_body(body: &[u8]) -> Self {
        let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
            let text = String::from_utf8_lossy(body).trim().to_string();
            return Self { code: None, message: (!text.is_empty()).then_some(text) };
        };

        let field = |names: &[&str]| {
            names.iter().find_map(|name| {
                value
                    .get(*name)
                    .or_else(|| value.get("error").and_then(|nested| nested.get(*name)))
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
            })
        };

        Self {
            code: field(&["error_code", "code"]),
            message: field(&["error_message", "message"])
                .or_else(|| value.get("error").and_then(|e| e.as_str()).map(str::to_string)),
        }
    }

    /// Whether the payload describes a permission problem rather than a bad key.
    pub fn mentions_permissions(&self) -> bool {
        [self.code.as_deref(), self.message.as_deref()].into_iter().flatten().any(|text| {
            let lower = text.to_ascii_lowercase();
            lower.contains("permission")
                || lower.contains("forbidden")
                || lower.contains("not allowed")
        })
    }

    pub fn describe(&self, status: u16) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (None, Some(message)) => message.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => format!("upstream returned status {status}"),
        }
    }
}

/// Data returned to UI collaborators with its freshness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fetched<T> {
    pub data: T,
    /// `true` when the live fetch failed and this is last-known-good data
    pub is_stale: bool,
    /// When the data was originally fetched, for cached results
    pub cached_at: Option<DateTime<Utc>>,
}

impl<T> Fetched<T> {
    pub fn fresh(data: T) -> Self {
        Self { data, is_stale: false, cached_at: None }
    }

    pub fn cached(data: T, is_stale: bool, cached_at: DateTime<Utc>) -> Self {
        Self { data, is_stale, cached_at: Some(cached_at) }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched { data: f(self.data), is_stale: self.is_stale, cached_at: self.cached_at }
    }

    /// Convert the payload, keeping freshness metadata.
    ///
    /// # Errors
    /// Propagates the conversion error.
    pub fn try_map<U, E>(
        self,
        f: impl FnOnce(T) -> std::result::Result<U, E>,
    ) -> std::result::Result<Fetched<U>, E> {
        Ok(Fetched { data: f(self.data)?, is_stale: self.is_stale, cached_at: self.cached_at })
    }
}
