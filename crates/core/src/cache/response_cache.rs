//! Last-known-good response cache with stale fallback
//!
//! Entries are fresh for the TTL. Past the TTL they are invisible to primary
//! reads ([`ResponseCache::get_fresh`]) but still served, flagged stale, by
//! [`ResponseCache::get_fallback`] once a live fetch has failed. Entries
//! older than TTL plus the stale-retention window are purged on `put`.
//!
//! Backed by a sharded [`DashMap`]; there is no global lock and writes are
//! last-writer-wins per key.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use console_domain::{CacheSettings, Fetched};
use dashmap::DashMap;
use tracing::{debug, trace};

use super::stats::{CacheStats, MetricsCollector};
use crate::time::{Clock, SystemClock};

/// Resource name plus canonicalised parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    resource: String,
    params: String,
}

impl CacheKey {
    pub fn new(resource: impl Into<String>, params: impl Into<String>) -> Self {
        Self { resource: resource.into(), params: params.into() }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn params(&self) -> &str {
        &self.params
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(&self.resource)
        } else {
            write!(f, "{}?{}", self.resource, self.params)
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub stored_at: Instant,
    pub stored_at_utc: DateTime<Utc>,
}

/// A cached value and whether it is past its TTL
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit<T> {
    pub data: T,
    pub is_stale: bool,
    pub stored_at: DateTime<Utc>,
}

impl<T> CacheHit<T> {
    pub fn into_fetched(self) -> Fetched<T> {
        Fetched::cached(self.data, self.is_stale, self.stored_at)
    }
}

pub struct ResponseCache<T> {
    entries: DashMap<CacheKey, CacheEntry<T>>,
    ttl: Duration,
    stale_retention: Duration,
    clock: Arc<dyn Clock>,
    metrics: MetricsCollector,
}

impl<T: Clone> ResponseCache<T> {
    pub fn new(settings: &CacheSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Create a cache with an injected clock (for testing).
    pub fn with_clock(settings: &CacheSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: settings.ttl(),
            stale_retention: settings.stale_retention(),
            clock,
            metrics: MetricsCollector::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Any entry for `key`, flagged stale if it is past the TTL.
    pub fn get(&self, key: &CacheKey) -> Option<CacheHit<T>> {
        let now = self.clock.now();
        self.entries.get(key).map(|entry| CacheHit {
            data: entry.data.clone(),
            is_stale: self.age(&entry, now) > self.ttl,
            stored_at: entry.stored_at_utc,
        })
    }

    /// Primary read: entries past the TTL count as absent.
    pub fn get_fresh(&self, key: &CacheKey) -> Option<CacheHit<T>> {
        match self.get(key) {
            Some(hit) if !hit.is_stale => {
                self.metrics.record_hit();
                trace!(key = %key, "response cache hit");
                Some(hit)
            }
            _ => {
                self.metrics.record_miss();
                trace!(key = %key, "response cache miss");
                None
            }
        }
    }

    /// Fallback read after a failed live fetch: any entry, always flagged
    /// stale since it stands in for data that could not be fetched.
    pub fn get_fallback(&self, key: &CacheKey) -> Option<CacheHit<T>> {
        let mut hit = self.get(key)?;
        hit.is_stale = true;
        self.metrics.record_stale_serve();
        debug!(key = %key, stored_at = %hit.stored_at, "serving stale response");
        Some(hit)
    }

    /// Store `data`, overwriting any previous entry for `key`.
    pub fn put(&self, key: CacheKey, data: T) {
        let entry =
            CacheEntry { data, stored_at: self.clock.now(), stored_at_utc: self.clock.utc_now() };
        trace!(key = %key, "response cached");
        self.entries.insert(key, entry);
        self.metrics.record_insert();
        self.purge_expired();
    }

    /// `true` if `key` is absent or its entry is past the TTL.
    pub fn is_expired(&self, key: &CacheKey) -> bool {
        let now = self.clock.now();
        self.entries.get(key).map_or(true, |entry| self.age(&entry, now) > self.ttl)
    }

    /// Drop entries past TTL plus stale retention. Returns how many went.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let limit = self.ttl.saturating_add(self.stale_retention);
        let before = self.entries.len();
        self.entries.retain(|_, entry| now.saturating_duration_since(entry.stored_at) <= limit);
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            self.metrics.record_purged(u64::try_from(purged).unwrap_or(u64::MAX));
            debug!(purged, "purged expired responses");
        }
        purged
    }

    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry belonging to `resource`.
    pub fn invalidate_resource(&self, resource: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.resource != resource);
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot(self.entries.len())
    }

    fn age(&self, entry: &CacheEntry<T>, now: Instant) -> Duration {
        now.saturating_duration_since(entry.stored_at)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::time::MockClock;

    fn settings() -> CacheSettings {
        CacheSettings { ttl_secs: 300, stale_retention_secs: 3600 }
    }

    fn cache() -> (ResponseCache<Value>, MockClock) {
        let clock = MockClock::new();
        (ResponseCache::with_clock(&settings(), Arc::new(clock.clone())), clock)
    }

    fn key(resource: &str) -> CacheKey {
        CacheKey::new(resource, "merchant=m1&profile=p1")
    }

    #[test]
    fn put_then_get_is_fresh() {
        let (cache, _clock) = cache();
        cache.put(key("connectors"), json!([{"connector_name": "stripe"}]));

        let hit = cache.get(&key("connectors")).unwrap();

        assert_eq!(hit.data, json!([{"connector_name": "stripe"}]));
        assert!(!hit.is_stale);
        assert!(!cache.is_expired(&key("connectors")));
    }

    #[test]
    fn past_ttl_primary_read_is_absent_but_fallback_is_stale() {
        let (cache, clock) = cache();
        cache.put(key("connectors"), json!(["stripe"]));

        clock.advance(Duration::from_secs(301));

        assert!(cache.is_expired(&key("connectors")));
        assert!(cache.get_fresh(&key("connectors")).is_none());
        assert!(cache.get(&key("connectors")).unwrap().is_stale);

        let fallback = cache.get_fallback(&key("connectors")).unwrap();
        assert_eq!(fallback.data, json!(["stripe"]));
        assert!(fallback.is_stale);
    }

    #[test]
    fn fallback_within_ttl_is_still_flagged_stale() {
        let (cache, _clock) = cache();
        cache.put(key("payments"), json!({"data": []}));

        assert!(cache.get_fallback(&key("payments")).unwrap().is_stale);
    }

    #[test]
    fn put_overwrites_and_resets_age() {
        let (cache, clock) = cache();
        cache.put(key("refunds"), json!(1));
        clock.advance(Duration::from_secs(400));
        cache.put(key("refunds"), json!(2));

        let hit = cache.get_fresh(&key("refunds")).unwrap();
        assert_eq!(hit.data, json!(2));
        assert!(!hit.is_stale);
    }

    #[test]
    fn keys_with_different_params_are_independent() {
        let (cache, _clock) = cache();
        cache.put(CacheKey::new("payments", "limit=10"), json!("first page"));

        assert!(cache.get(&CacheKey::new("payments", "limit=20")).is_none());
        assert!(cache.get(&CacheKey::new("refunds", "limit=10")).is_none());
    }

    #[test]
    fn entries_beyond_retention_are_purged_on_put() {
        let (cache, clock) = cache();
        cache.put(key("disputes"), json!([]));
        clock.advance(Duration::from_secs(300 + 3600 + 1));

        cache.put(key("customers"), json!([]));

        assert!(cache.get(&key("disputes")).is_none());
        assert!(cache.get(&key("customers")).is_some());
        assert_eq!(cache.stats().purged, 1);
    }

    #[test]
    fn invalidate_resource_drops_all_variants() {
        let (cache, _clock) = cache();
        cache.put(CacheKey::new("payments", "limit=10"), json!(1));
        cache.put(CacheKey::new("payments", "limit=20"), json!(2));
        cache.put(CacheKey::new("refunds", ""), json!(3));

        assert_eq!(cache.invalidate_resource("payments"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.invalidate(&CacheKey::new("refunds", "")));
        assert!(cache.is_empty());
    }

    #[test]
    fn stats_track_reads() {
        let (cache, _clock) = cache();
        cache.put(key("connectors"), json!([]));

        cache.get_fresh(&key("connectors"));
        cache.get_fresh(&key("payments"));
        cache.get_fallback(&key("connectors"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.stale_serves, 1);
        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.size, 1);
    }

    #[test]
    fn key_display() {
        assert_eq!(CacheKey::new("connectors", "").to_string(), "connectors");
        assert_eq!(CacheKey::new("payments", "limit=10").to_string(), "payments?limit=10");
    }
}
