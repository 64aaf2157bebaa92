//! Query cache with explicit freshness and in-flight deduplication.
//!
//! # Design
//!
//! Every entry remembers when it was last fetched successfully. Reads are
//! routed by that age against the [`FreshnessPolicy`]:
//!
//! - fresh: served from memory, no network call
//! - stale with a value: served from memory while a background refetch runs
//! - no value yet: the read waits for the fetch
//!
//! At most one fetch per key is in flight. Concurrent readers of the same key
//! attach to it. Fetches run as spawned tasks, so a reader that goes away does
//! not cancel the fetch other readers (and the cache) are waiting on.
//!
//! # Example
//!
//! ```ignore
//! let cache = QueryCache::new(Arc::new(fetcher), FreshnessPolicy::default());
//!
//! let state = cache.read(&CacheKey::list(TransactionKind::Purchase)).await;
//! if let Some(transactions) = state.data() {
//!     render(transactions);
//! }
//!
//! // After a successful purchase mutation
//! cache.invalidate_namespace(TransactionKind::Purchase).await;
//! ```

pub mod entry;
pub mod freshness;
pub mod key;
pub mod read_through;
pub mod traits;

pub use entry::{CacheEntry, EntryState};
pub use freshness::{FreshnessPolicy, QueryState, ReadOrigin};
pub use key::CacheKey;
pub use read_through::QueryCache;
pub use traits::{CacheStats, QueryFetcher};
