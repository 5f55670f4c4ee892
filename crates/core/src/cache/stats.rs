//! Response cache statistics

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of cache activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries
    pub size: usize,

    /// Primary reads answered with fresh data
    pub hits: u64,

    /// Primary reads that found nothing fresh
    pub misses: u64,

    /// Fallback reads that served last-known-good data after a failed fetch
    pub stale_serves: u64,

    pub inserts: u64,

    /// Entries dropped for exceeding TTL plus stale retention
    pub purged: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Lock-free counters behind [`CacheStats`]
#[derive(Debug, Default)]
pub(crate) struct MetricsCollector {
    hits: AtomicU64,
    misses: AtomicU64,
    stale_serves: AtomicU64,
    inserts: AtomicU64,
    purged: AtomicU64,
}

impl MetricsCollector {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stale_serve(&self) {
        self.stale_serves.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_purged(&self, count: u64) {
        self.purged.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, size: usize) -> CacheStats {
        CacheStats {
            size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale_serves: self.stale_serves.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            purged: self.purged.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_handles_no_traffic() {
        assert!((CacheStats::default().hit_rate() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn snapshot_reflects_recorded_events() {
        let metrics = MetricsCollector::default();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();
        metrics.record_stale_serve();
        metrics.record_insert();
        metrics.record_purged(3);

        let stats = metrics.snapshot(7);

        assert_eq!(stats.size, 7);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.stale_serves, 1);
        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.purged, 3);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }
}
