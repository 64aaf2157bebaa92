//! Freshness policy and the read result handed to consumers.

use std::time::Duration;
use tally_core::{QueryScope, TallyError, Timestamp};

use super::key::CacheKey;

/// How long a successful fetch stays fresh, per query scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub list_ttl: Duration,
    pub detail_ttl: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            list_ttl: Duration::from_secs(2 * 60),
            detail_ttl: Duration::from_secs(5 * 60),
        }
    }
}

impl FreshnessPolicy {
    pub fn new(list_ttl: Duration, detail_ttl: Duration) -> Self {
        Self {
            list_ttl,
            detail_ttl,
        }
    }

    pub fn with_list_ttl(mut self, ttl: Duration) -> Self {
        self.list_ttl = ttl;
        self
    }

    pub fn with_detail_ttl(mut self, ttl: Duration) -> Self {
        self.detail_ttl = ttl;
        self
    }

    pub fn ttl_for(&self, key: &CacheKey) -> Duration {
        match key.scope() {
            QueryScope::List => self.list_ttl,
            QueryScope::Detail => self.detail_ttl,
        }
    }
}

/// Where the data of a [`QueryState`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOrigin {
    /// Served from memory without waiting on the network.
    Cache,
    /// Produced by a fetch this read waited for.
    Network,
    /// No data.
    None,
}

/// Result of a query: the data (if any), whether a fetch is running, and
/// the last error.
///
/// A state can carry both data and an error: that is the last-known value
/// kept as a fallback after a failed refetch.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    data: Option<T>,
    is_loading: bool,
    error: Option<TallyError>,
    fetched_at: Option<Timestamp>,
    origin: ReadOrigin,
}

impl<T> QueryState<T> {
    /// State of an inert query: nothing fetched, nothing loading.
    pub fn idle() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
            fetched_at: None,
            origin: ReadOrigin::None,
        }
    }

    /// Served from memory. `revalidating` is true while a refetch runs.
    pub fn from_cache(
        value: T,
        fetched_at: Option<Timestamp>,
        revalidating: bool,
        error: Option<TallyError>,
    ) -> Self {
        Self {
            data: Some(value),
            is_loading: revalidating,
            error,
            fetched_at,
            origin: ReadOrigin::Cache,
        }
    }

    /// Produced by a fetch the caller waited for.
    pub fn from_network(value: T, fetched_at: Timestamp) -> Self {
        Self {
            data: Some(value),
            is_loading: false,
            error: None,
            fetched_at: Some(fetched_at),
            origin: ReadOrigin::Network,
        }
    }

    /// A fetch failed. `fallback` is the last-known value, if any.
    pub fn failed(error: TallyError, fallback: Option<(T, Option<Timestamp>)>) -> Self {
        match fallback {
            Some((value, fetched_at)) => Self {
                data: Some(value),
                is_loading: false,
                error: Some(error),
                fetched_at,
                origin: ReadOrigin::Cache,
            },
            None => Self {
                data: None,
                is_loading: false,
                error: Some(error),
                fetched_at: None,
                origin: ReadOrigin::None,
            },
        }
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&TallyError> {
        self.error.as_ref()
    }

    /// When the data was last fetched successfully.
    pub fn fetched_at(&self) -> Option<Timestamp> {
        self.fetched_at
    }

    pub fn origin(&self) -> ReadOrigin {
        self.origin
    }

    /// True when data is present and the last fetch did not fail.
    pub fn is_success(&self) -> bool {
        self.data.is_some() && self.error.is_none()
    }

    /// Convert into a `Result`, dropping the fallback value on error.
    pub fn into_result(self) -> Result<Option<T>, TallyError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.data),
        }
    }

    /// Map the inner value, dropping it when `f` returns `None`.
    pub fn filter_map<U, F>(self, f: F) -> QueryState<U>
    where
        F: FnOnce(T) -> Option<U>,
    {
        QueryState {
            data: self.data.and_then(f),
            is_loading: self.is_loading,
            error: self.error,
            fetched_at: self.fetched_at,
            origin: self.origin,
        }
    }

    /// Map the inner value to a new type.
    pub fn map<U, F>(self, f: F) -> QueryState<U>
    where
        F: FnOnce(T) -> U,
    {
        QueryState {
            data: self.data.map(f),
            is_loading: self.is_loading,
            error: self.error,
            fetched_at: self.fetched_at,
            origin: self.origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tally_core::{RemoteError, TransactionKind};

    #[test]
    fn test_default_policy() {
        let policy = FreshnessPolicy::default();
        assert_eq!(
            policy.ttl_for(&CacheKey::list(TransactionKind::Purchase)),
            Duration::from_secs(120)
        );
        assert_eq!(
            policy.ttl_for(&CacheKey::detail(TransactionKind::Rental, "1").unwrap()),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn test_idle_state() {
        let state = QueryState::<i32>::idle();
        assert!(state.data().is_none());
        assert!(!state.is_loading());
        assert!(state.error().is_none());
        assert_eq!(state.origin(), ReadOrigin::None);
    }

    #[test]
    fn test_failed_with_fallback_keeps_value() {
        let err: TallyError = RemoteError::Network {
            reason: "offline".into(),
        }
        .into();
        let state = QueryState::failed(err.clone(), Some((5, None)));
        assert_eq!(state.data(), Some(&5));
        assert_eq!(state.error(), Some(&err));
        assert!(!state.is_success());
        assert_eq!(state.into_result(), Err(err));
    }

    #[test]
    fn test_map_preserves_metadata() {
        let now = Utc::now();
        let state = QueryState::from_network(42, now).map(|v| v.to_string());
        assert_eq!(state.data().map(String::as_str), Some("42"));
        assert_eq!(state.fetched_at(), Some(now));
        assert_eq!(state.origin(), ReadOrigin::Network);
    }
}
