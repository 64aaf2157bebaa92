//! Query/mutate facade over the cache, coordinator and gateway.

use std::sync::Arc;

use tally_core::{QueryScope, RecordId, TallyResult, Transaction, TransactionKind};
use tally_remote::{ProductSource, TransactionSource};
use tally_storage::{CacheKey, CacheStats, EntryState, FreshnessPolicy, QueryCache, QueryState};

use crate::enrichment::{EnrichmentCoordinator, QueryData};
use crate::mutation::{Mutation, MutationGateway, MutationOutcome};

/// Entry point for consumers.
///
/// Build one at startup and pass it by reference. Construction is cheap, so
/// tests build one per case.
#[derive(Clone, Debug)]
pub struct TransactionService {
    cache: QueryCache<QueryData, EnrichmentCoordinator>,
    gateway: MutationGateway,
}

impl TransactionService {
    pub fn new(
        transactions: Arc<dyn TransactionSource>,
        products: Arc<dyn ProductSource>,
        policy: FreshnessPolicy,
    ) -> Self {
        let coordinator = Arc::new(EnrichmentCoordinator::new(
            Arc::clone(&transactions),
            products,
        ));
        let cache = QueryCache::new(coordinator, policy);
        let gateway = MutationGateway::new(transactions, cache.clone());
        Self { cache, gateway }
    }

    /// Read a list or a detail under the freshness policy.
    ///
    /// A detail query with a missing or blank id is inert: nothing is
    /// fetched and no cache entry is created.
    pub async fn query(
        &self,
        kind: TransactionKind,
        scope: QueryScope,
        id: Option<&RecordId>,
    ) -> QueryState<QueryData> {
        match CacheKey::new(kind, scope, id) {
            Some(key) => self.cache.read(&key).await,
            None => {
                tracing::debug!(%kind, %scope, "Inert query, no record id");
                QueryState::idle()
            }
        }
    }

    /// Force a refetch of a query, bypassing freshness.
    pub async fn refetch(
        &self,
        kind: TransactionKind,
        scope: QueryScope,
        id: Option<&RecordId>,
    ) -> QueryState<QueryData> {
        match CacheKey::new(kind, scope, id) {
            Some(key) => self.cache.refetch(&key).await,
            None => QueryState::idle(),
        }
    }

    pub async fn list(&self, kind: TransactionKind) -> QueryState<Vec<Transaction>> {
        self.query(kind, QueryScope::List, None)
            .await
            .filter_map(QueryData::into_list)
    }

    pub async fn detail(&self, kind: TransactionKind, id: &RecordId) -> QueryState<Transaction> {
        self.query(kind, QueryScope::Detail, Some(id))
            .await
            .filter_map(QueryData::into_detail)
    }

    /// Apply a create or delete. See [`MutationGateway::mutate`].
    pub async fn mutate(
        &self,
        kind: TransactionKind,
        mutation: Mutation,
    ) -> TallyResult<MutationOutcome> {
        self.gateway.mutate(kind, mutation).await
    }

    /// A reusable handle bound to one query.
    pub fn handle(
        &self,
        kind: TransactionKind,
        scope: QueryScope,
        id: Option<RecordId>,
    ) -> Query<'_> {
        Query {
            service: self,
            kind,
            scope,
            id,
        }
    }

    /// Wait until no fetch is running for the query.
    pub async fn settle(&self, kind: TransactionKind, scope: QueryScope, id: Option<&RecordId>) {
        if let Some(key) = CacheKey::new(kind, scope, id) {
            self.cache.wait_idle(&key).await;
        }
    }

    pub async fn entry_state(
        &self,
        kind: TransactionKind,
        scope: QueryScope,
        id: Option<&RecordId>,
    ) -> EntryState {
        match CacheKey::new(kind, scope, id) {
            Some(key) => self.cache.entry_state(&key).await,
            None => EntryState::Empty,
        }
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub fn cache(&self) -> &QueryCache<QueryData, EnrichmentCoordinator> {
        &self.cache
    }
}

/// One query's `read` / `refetch` pair.
#[derive(Debug, Clone)]
pub struct Query<'a> {
    service: &'a TransactionService,
    kind: TransactionKind,
    scope: QueryScope,
    id: Option<RecordId>,
}

impl Query<'_> {
    pub async fn read(&self) -> QueryState<QueryData> {
        self.service
            .query(self.kind, self.scope, self.id.as_ref())
            .await
    }

    pub async fn refetch(&self) -> QueryState<QueryData> {
        self.service
            .refetch(self.kind, self.scope, self.id.as_ref())
            .await
    }
}
