//! Response caching with stale fallback

mod response_cache;
mod stats;

pub use response_cache::{CacheEntry, CacheHit, CacheKey, ResponseCache};
pub use stats::CacheStats;
