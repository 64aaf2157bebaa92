//! Read-through query cache with stale-while-revalidate reads.
//!
//! This module implements the core caching logic: routing reads by entry
//! age, running at most one fetch per key, and namespace invalidation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::FutureExt;
use tally_core::{CacheError, TallyError, TallyResult, TransactionKind};
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::entry::{CacheEntry, EntryState, Fetch, InFlight};
use super::freshness::{FreshnessPolicy, QueryState};
use super::key::CacheKey;
use super::traits::{CacheStats, QueryFetcher};

struct Inner<V> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    stats: CacheStats,
}

/// Keyed query cache.
///
/// Constructed once and shared by reference (or by cheap `Clone`); build a
/// fresh one per test for isolation.
///
/// # Type Parameters
///
/// - `V`: the cached value
/// - `F`: the fetcher that produces values on miss or staleness
pub struct QueryCache<V, F> {
    inner: Arc<Mutex<Inner<V>>>,
    fetcher: Arc<F>,
    policy: FreshnessPolicy,
}

impl<V, F> QueryCache<V, F>
where
    V: Clone + Send + Sync + 'static,
    F: QueryFetcher<V>,
{
    pub fn new(fetcher: Arc<F>, policy: FreshnessPolicy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            })),
            fetcher,
            policy,
        }
    }

    /// Create a cache with the default 2 minute list / 5 minute detail policy.
    pub fn with_defaults(fetcher: Arc<F>) -> Self {
        Self::new(fetcher, FreshnessPolicy::default())
    }

    pub fn policy(&self) -> &FreshnessPolicy {
        &self.policy
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Read a key.
    ///
    /// - Fresh entry: returns the cached value, no fetch.
    /// - Entry past its TTL: returns the old value at once and starts (or
    ///   joins) a background refetch.
    /// - No value yet, or the value was invalidated: waits for the fetch. On
    ///   failure the state carries the error.
    pub async fn read(&self, key: &CacheKey) -> QueryState<V> {
        let ttl = self.policy.ttl_for(key);
        let pending = {
            let mut guard = self.inner.lock().await;
            let Inner { entries, stats } = &mut *guard;
            let entry = entries.entry(key.clone()).or_default();

            if let Some(value) = entry.value.clone().filter(|_| !entry.invalidated) {
                if entry.is_fresh(Instant::now(), ttl) {
                    stats.hits += 1;
                    tracing::debug!(%key, "cache hit");
                    return QueryState::from_cache(
                        value,
                        entry.last_fetched_at,
                        entry.is_loading(),
                        entry.error.clone(),
                    );
                }

                stats.stale_hits += 1;
                tracing::debug!(%key, "serving stale value, revalidating");
                // Readers only observe the refetch through later reads.
                drop(self.ensure_in_flight(key, entry, stats));
                return QueryState::from_cache(
                    value,
                    entry.last_fetched_at,
                    true,
                    entry.error.clone(),
                );
            }

            // Invalidated values predate a mutation and are never served.
            stats.misses += 1;
            tracing::debug!(%key, invalidated = entry.invalidated, "cache miss");
            self.ensure_in_flight(key, entry, stats)
        };

        let outcome = pending.await;
        self.settle(key, outcome).await
    }

    /// Force a fetch for `key`, joining one already in flight.
    pub async fn refetch(&self, key: &CacheKey) -> QueryState<V> {
        let pending = {
            let mut guard = self.inner.lock().await;
            let Inner { entries, stats } = &mut *guard;
            let entry = entries.entry(key.clone()).or_default();
            self.ensure_in_flight(key, entry, stats)
        };

        let outcome = pending.await;
        self.settle(key, outcome).await
    }

    /// Wait for the fetch currently running for `key`, if any.
    pub async fn wait_idle(&self, key: &CacheKey) {
        let pending = {
            let guard = self.inner.lock().await;
            guard
                .entries
                .get(key)
                .and_then(|entry| entry.in_flight.as_ref())
                .map(|fetch| fetch.result.clone())
        };
        if let Some(pending) = pending {
            let _ = pending.await;
        }
    }

    /// Cached value for `key` without fetching, fresh or not.
    pub async fn peek(&self, key: &CacheKey) -> Option<V> {
        let guard = self.inner.lock().await;
        guard.entries.get(key).and_then(|entry| entry.value.clone())
    }

    pub async fn entry_state(&self, key: &CacheKey) -> EntryState {
        let ttl = self.policy.ttl_for(key);
        let guard = self.inner.lock().await;
        guard
            .entries
            .get(key)
            .map(|entry| entry.state(Instant::now(), ttl))
            .unwrap_or(EntryState::Empty)
    }

    /// Invalidate a single key. Returns whether an entry existed.
    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        let mut guard = self.inner.lock().await;
        match guard.entries.get_mut(key) {
            Some(entry) => {
                entry.invalidate();
                tracing::debug!(%key, "invalidated");
                true
            }
            None => false,
        }
    }

    /// Invalidate every entry of `kind`: its list and all of its details.
    pub async fn invalidate_namespace(&self, kind: TransactionKind) -> usize {
        let mut guard = self.inner.lock().await;
        let mut count = 0;
        for (key, entry) in guard.entries.iter_mut() {
            if key.in_namespace(kind) {
                entry.invalidate();
                count += 1;
            }
        }
        tracing::debug!(%kind, count, "invalidated namespace");
        count
    }

    /// Invalidate every entry in the cache.
    pub async fn invalidate_all(&self) -> usize {
        let mut guard = self.inner.lock().await;
        for entry in guard.entries.values_mut() {
            entry.invalidate();
        }
        guard.entries.len()
    }

    pub async fn stats(&self) -> CacheStats {
        let guard = self.inner.lock().await;
        CacheStats {
            entry_count: guard.entries.len() as u64,
            ..guard.stats.clone()
        }
    }

    /// Return the running fetch for `key`, or spawn one.
    ///
    /// Called with the cache lock held, so check-and-spawn is atomic.
    fn ensure_in_flight(
        &self,
        key: &CacheKey,
        entry: &mut CacheEntry<V>,
        stats: &mut CacheStats,
    ) -> InFlight<V> {
        if let Some(fetch) = &entry.in_flight {
            // A finished task still attached died before writing back;
            // start over instead of replaying its failure.
            if !fetch.is_dead() {
                stats.dedup_joins += 1;
                tracing::debug!(%key, "joining in-flight fetch");
                return fetch.result.clone();
            }
        }

        stats.fetches += 1;
        tracing::debug!(%key, "starting fetch");

        let generation = entry.generation;
        let fetcher = Arc::clone(&self.fetcher);
        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            let outcome = fetcher.fetch(&task_key).await;

            let mut guard = inner.lock().await;
            let Inner { entries, stats } = &mut *guard;
            if let Some(entry) = entries.get_mut(&task_key) {
                if entry.generation == generation {
                    entry.in_flight = None;
                    match &outcome {
                        Ok(value) => entry.record_success(value.clone()),
                        Err(err) => {
                            stats.failures += 1;
                            tracing::debug!(key = %task_key, error = %err, "fetch failed");
                            entry.record_failure(err.clone());
                        }
                    }
                } else {
                    tracing::debug!(key = %task_key, "discarding fetch superseded by invalidation");
                }
            }
            outcome
        });

        let task = handle.abort_handle();
        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let pending: InFlight<V> = async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    let err: TallyError = CacheError::FetchAborted {
                        key: task_key.to_string(),
                        reason: join_err.to_string(),
                    }
                    .into();
                    let mut guard = inner.lock().await;
                    let Inner { entries, stats } = &mut *guard;
                    if let Some(entry) = entries.get_mut(&task_key) {
                        if entry.generation == generation && entry.in_flight.is_some() {
                            entry.in_flight = None;
                            stats.failures += 1;
                            entry.record_failure(err.clone());
                        }
                    }
                    tracing::debug!(key = %task_key, error = %err, "fetch task died");
                    Err(err)
                }
            }
        }
        .boxed()
        .shared();

        entry.in_flight = Some(Fetch {
            result: pending.clone(),
            task,
        });
        pending
    }

    async fn settle(&self, key: &CacheKey, outcome: TallyResult<V>) -> QueryState<V> {
        match outcome {
            Ok(value) => QueryState::from_network(value, Utc::now()),
            Err(err) => {
                let guard = self.inner.lock().await;
                let fallback = guard.entries.get(key).and_then(|entry| {
                    entry
                        .value
                        .clone()
                        .map(|value| (value, entry.last_fetched_at))
                });
                QueryState::failed(err, fallback)
            }
        }
    }
}

impl<V, F> Clone for QueryCache<V, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            fetcher: Arc::clone(&self.fetcher),
            policy: self.policy,
        }
    }
}

impl<V, F> std::fmt::Debug for QueryCache<V, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
