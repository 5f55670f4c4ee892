//! Logical request descriptors and the prepared form handed to transports

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::impl_label_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl_label_conversions!(HttpMethod {
    Get => "get",
    Post => "post",
    Put => "put",
    Patch => "patch",
    Delete => "delete",
});

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// How a logical operation interacts with the response cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Always fetch live; cached data is only a fallback on failure
    #[default]
    NetworkFirst,
    /// Serve a fresh cached entry without I/O, otherwise behave like `NetworkFirst`
    CacheFirst,
    /// Never read or write the cache (mutations)
    Bypass,
}

impl_label_conversions!(CachePolicy {
    NetworkFirst => "network_first",
    CacheFirst => "cache_first",
    Bypass => "bypass",
});

/// What a UI collaborator asks the client to do
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    /// Path relative to the configured base URL, starting with `/`
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
    pub cache_policy: CachePolicy,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let cache_policy =
            if method == HttpMethod::Get { CachePolicy::NetworkFirst } else { CachePolicy::Bypass };
        Self { method, path: path.into(), query: BTreeMap::new(), body: None, cache_policy }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(HttpMethod::Put, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Deterministic rendering of everything that selects the response:
    /// sorted query pairs, then the body (object keys are sorted by
    /// `serde_json`'s default map).
    pub fn canonical_params(&self) -> String {
        let mut out = self
            .query
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        if let Some(body) = &self.body {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str("body=");
            out.push_str(&body.to_string());
        }
        out
    }
}

/// A fully resolved request ready for a single transport attempt
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl PreparedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_cache_policy_depends_on_method() {
        assert_eq!(RequestDescriptor::get("/payments/list").cache_policy, CachePolicy::NetworkFirst);
        assert_eq!(
            RequestDescriptor::post("/payments", json!({"amount": 100})).cache_policy,
            CachePolicy::Bypass
        );
    }

    #[test]
    fn canonical_params_ignore_insertion_order() {
        let a = RequestDescriptor::get("/refunds/list").with_query("limit", "10").with_query("offset", "0");
        let b = RequestDescriptor::get("/refunds/list").with_query("offset", "0").with_query("limit", "10");
        assert_eq!(a.canonical_params(), b.canonical_params());
        assert_eq!(a.canonical_params(), "limit=10&offset=0");
    }

    #[test]
    fn canonical_params_include_body() {
        let descriptor = RequestDescriptor::post("/payments/list", json!({"status": "succeeded"}))
            .with_query("limit", "5");
        assert_eq!(descriptor.canonical_params(), r#"limit=5&body={"status":"succeeded"}"#);
    }

    #[test]
    fn method_labels() {
        assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
        assert_eq!("delete".parse::<HttpMethod>(), Ok(HttpMethod::Delete));
        assert_eq!("cache_first".parse::<CachePolicy>(), Ok(CachePolicy::CacheFirst));
    }
}
