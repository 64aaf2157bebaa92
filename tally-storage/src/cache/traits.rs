//! Fetcher trait and cache statistics.

use async_trait::async_trait;
use tally_core::TallyResult;

use super::key::CacheKey;

/// Produces the value for a cache key on miss, staleness or refetch.
///
/// Implementations must be `'static` because fetches run on spawned tasks
/// that outlive the read that started them.
#[async_trait]
pub trait QueryFetcher<V>: Send + Sync + 'static {
    /// Fetch the current value for `key` from the remote sources.
    async fn fetch(&self, key: &CacheKey) -> TallyResult<V>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from a fresh entry.
    pub hits: u64,
    /// Reads served from a stale entry while revalidating.
    pub stale_hits: u64,
    /// Reads that had no value and waited for a fetch.
    pub misses: u64,
    /// Fetches started.
    pub fetches: u64,
    /// Reads or refetches that attached to a fetch already in flight.
    pub dedup_joins: u64,
    /// Fetches that completed with an error.
    pub failures: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
}

impl CacheStats {
    /// Share of reads answered from memory (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.stale_hits;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 60,
            stale_hits: 20,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }
}
