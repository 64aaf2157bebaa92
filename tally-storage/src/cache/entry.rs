//! Per-key cache entries and their state machine.

use chrono::Utc;
use futures_util::future::{BoxFuture, Shared};
use std::fmt;
use std::time::Duration;
use tally_core::{TallyError, TallyResult, Timestamp};
use tokio::task::AbortHandle;
use tokio::time::Instant;

/// Handle to the single fetch running for a key.
pub(crate) type InFlight<V> = Shared<BoxFuture<'static, TallyResult<V>>>;

/// A running fetch: the shared result plus the task producing it.
pub(crate) struct Fetch<V> {
    pub(crate) result: InFlight<V>,
    pub(crate) task: AbortHandle,
}

impl<V> Fetch<V> {
    /// A task that ended without writing back (panicked or aborted).
    pub(crate) fn is_dead(&self) -> bool {
        self.task.is_finished()
    }
}

/// Observable state of an entry.
///
/// `Empty -> Loading -> Fresh -> Stale -> Loading -> Fresh`, with any failed
/// fetch moving to `Error` while the last good value is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    Empty,
    Loading,
    Fresh,
    Stale,
    Error,
}

/// One cache slot. Created on first read of its key and never removed.
pub struct CacheEntry<V> {
    pub(crate) value: Option<V>,
    pub(crate) error: Option<TallyError>,
    pub(crate) last_fetched_at: Option<Timestamp>,
    pub(crate) fetched_instant: Option<Instant>,
    pub(crate) invalidated: bool,
    /// Bumped on every invalidation. A fetch only writes back if the
    /// generation it started under is still current.
    pub(crate) generation: u64,
    pub(crate) in_flight: Option<Fetch<V>>,
}

impl<V> Default for CacheEntry<V> {
    fn default() -> Self {
        Self {
            value: None,
            error: None,
            last_fetched_at: None,
            fetched_instant: None,
            invalidated: false,
            generation: 0,
            in_flight: None,
        }
    }
}

impl<V> CacheEntry<V> {
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn error(&self) -> Option<&TallyError> {
        self.error.as_ref()
    }

    /// Wall-clock time of the last successful fetch.
    pub fn last_fetched_at(&self) -> Option<Timestamp> {
        self.last_fetched_at
    }

    /// True while a fetch task is attached and still running.
    pub fn is_loading(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|fetch| !fetch.is_dead())
    }

    /// True when a value exists, was not invalidated, and is younger than `ttl`.
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        if self.value.is_none() || self.invalidated {
            return false;
        }
        self.fetched_instant
            .map(|fetched| now.saturating_duration_since(fetched) < ttl)
            .unwrap_or(false)
    }

    pub fn state(&self, now: Instant, ttl: Duration) -> EntryState {
        if self.is_loading() {
            EntryState::Loading
        } else if self.error.is_some() {
            EntryState::Error
        } else if self.value.is_none() {
            EntryState::Empty
        } else if self.is_fresh(now, ttl) {
            EntryState::Fresh
        } else {
            EntryState::Stale
        }
    }

    pub(crate) fn record_success(&mut self, value: V) {
        self.value = Some(value);
        self.error = None;
        self.last_fetched_at = Some(Utc::now());
        self.fetched_instant = Some(Instant::now());
        self.invalidated = false;
    }

    /// Keep the previous value as a fallback.
    pub(crate) fn record_failure(&mut self, error: TallyError) {
        self.error = Some(error);
    }

    /// Mark stale and detach any running fetch.
    pub(crate) fn invalidate(&mut self) {
        self.invalidated = true;
        self.generation = self.generation.wrapping_add(1);
        self.in_flight = None;
    }
}

impl<V> fmt::Debug for CacheEntry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("has_value", &self.value.is_some())
            .field("error", &self.error)
            .field("last_fetched_at", &self.last_fetched_at)
            .field("invalidated", &self.invalidated)
            .field("generation", &self.generation)
            .field("in_flight", &self.in_flight.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::RemoteError;

    const TTL: Duration = Duration::from_secs(120);

    #[tokio::test(start_paused = true)]
    async fn test_fresh_then_stale() {
        let mut entry = CacheEntry::<u32>::default();
        assert_eq!(entry.state(Instant::now(), TTL), EntryState::Empty);

        entry.record_success(1);
        assert_eq!(entry.state(Instant::now(), TTL), EntryState::Fresh);

        tokio::time::advance(TTL).await;
        assert_eq!(entry.state(Instant::now(), TTL), EntryState::Stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_marks_stale() {
        let mut entry = CacheEntry::<u32>::default();
        entry.record_success(1);
        entry.invalidate();

        assert_eq!(entry.state(Instant::now(), TTL), EntryState::Stale);
        assert_eq!(entry.generation, 1);
        assert_eq!(entry.value(), Some(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_value() {
        let mut entry = CacheEntry::<u32>::default();
        entry.record_success(1);
        entry.record_failure(
            RemoteError::Network {
                reason: "offline".into(),
            }
            .into(),
        );

        assert_eq!(entry.state(Instant::now(), TTL), EntryState::Error);
        assert_eq!(entry.value(), Some(&1));

        entry.record_success(2);
        assert_eq!(entry.state(Instant::now(), TTL), EntryState::Fresh);
        assert!(entry.error().is_none());
    }
}
