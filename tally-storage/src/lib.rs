//! Tally Storage - Query Cache
//!
//! Holds enriched transaction lists and details between reads. Entries are
//! addressed by a structured [`CacheKey`], served stale-while-revalidate, and
//! invalidated per kind when a mutation of that kind succeeds.

pub mod cache;

pub use cache::{
    CacheEntry, CacheKey, CacheStats, EntryState, FreshnessPolicy, QueryCache, QueryFetcher,
    QueryState, ReadOrigin,
};
