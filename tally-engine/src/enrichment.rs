//! Enrichment coordinator.
//!
//! Fans out one product lookup per raw record, runs them concurrently, and
//! places each result back at its record's original index. A failed lookup
//! degrades only its own record to "no product". Only a failure of the
//! primary list or detail fetch fails the whole operation.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tally_core::{
    Product, QueryScope, RecordId, TallyError, TallyResult, Transaction, TransactionKind,
};
use tally_remote::{ProductSource, TransactionSource};
use tally_storage::{CacheKey, QueryFetcher};

use crate::transform::Enrichable;

/// Value stored under a cache key: a whole list, or one transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryData {
    List(Vec<Transaction>),
    Detail(Transaction),
}

impl QueryData {
    pub fn as_list(&self) -> Option<&[Transaction]> {
        match self {
            QueryData::List(items) => Some(items),
            QueryData::Detail(_) => None,
        }
    }

    pub fn as_detail(&self) -> Option<&Transaction> {
        match self {
            QueryData::List(_) => None,
            QueryData::Detail(item) => Some(item),
        }
    }

    pub fn into_list(self) -> Option<Vec<Transaction>> {
        match self {
            QueryData::List(items) => Some(items),
            QueryData::Detail(_) => None,
        }
    }

    pub fn into_detail(self) -> Option<Transaction> {
        match self {
            QueryData::List(_) => None,
            QueryData::Detail(item) => Some(item),
        }
    }
}

pub struct EnrichmentCoordinator {
    transactions: Arc<dyn TransactionSource>,
    products: Arc<dyn ProductSource>,
}

impl EnrichmentCoordinator {
    pub fn new(transactions: Arc<dyn TransactionSource>, products: Arc<dyn ProductSource>) -> Self {
        Self {
            transactions,
            products,
        }
    }

    /// Merge every record with its product, preserving input order.
    ///
    /// The output always has the same length as `records`. An empty input
    /// issues no product lookups.
    pub async fn enrich<R: Enrichable>(&self, records: Vec<R>) -> Vec<Transaction> {
        if records.is_empty() {
            return Vec::new();
        }

        let mut slots: Vec<Option<Transaction>> = (0..records.len()).map(|_| None).collect();
        let mut lookups: FuturesUnordered<_> = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| async move {
                let outcome = self.products.get_product(record.product_id()).await;
                (index, record, outcome)
            })
            .collect();

        while let Some((index, record, outcome)) = lookups.next().await {
            let product = self.tolerate(&record, outcome);
            slots[index] = Some(record.into_transaction(product));
        }

        slots.into_iter().flatten().collect()
    }

    /// Enrich a single record with the same failure policy as [`Self::enrich`].
    pub async fn enrich_one<R: Enrichable>(&self, record: R) -> Transaction {
        let outcome = self.products.get_product(record.product_id()).await;
        let product = self.tolerate(&record, outcome);
        record.into_transaction(product)
    }

    /// Fetch and enrich every record of `kind`.
    pub async fn list(&self, kind: TransactionKind) -> TallyResult<Vec<Transaction>> {
        match kind {
            TransactionKind::Purchase => {
                let records = self.transactions.list_purchases().await?;
                Ok(self.enrich(records).await)
            }
            TransactionKind::Rental => {
                let records = self.transactions.list_rentals().await?;
                Ok(self.enrich(records).await)
            }
        }
    }

    /// Fetch and enrich one record.
    pub async fn detail(&self, kind: TransactionKind, id: &RecordId) -> TallyResult<Transaction> {
        match kind {
            TransactionKind::Purchase => {
                let record = self.transactions.get_purchase(id).await?;
                Ok(self.enrich_one(record).await)
            }
            TransactionKind::Rental => {
                let record = self.transactions.get_rental(id).await?;
                Ok(self.enrich_one(record).await)
            }
        }
    }

    fn tolerate<R: Enrichable>(
        &self,
        record: &R,
        outcome: TallyResult<Product>,
    ) -> Option<Product> {
        match outcome {
            Ok(product) => Some(product),
            Err(err) => {
                tracing::warn!(
                    kind = %R::KIND,
                    record_id = %record.id(),
                    product_id = %record.product_id(),
                    error = %err,
                    "Product lookup failed, continuing without product"
                );
                None
            }
        }
    }
}

#[async_trait]
impl QueryFetcher<QueryData> for EnrichmentCoordinator {
    async fn fetch(&self, key: &CacheKey) -> TallyResult<QueryData> {
        match (key.scope(), key.id()) {
            (QueryScope::List, _) => self.list(key.kind()).await.map(QueryData::List),
            (QueryScope::Detail, Some(id)) => {
                self.detail(key.kind(), id).await.map(QueryData::Detail)
            }
            (QueryScope::Detail, None) => Err(TallyError::validation(format!(
                "detail key {} has no record id",
                key
            ))),
        }
    }
}

impl std::fmt::Debug for EnrichmentCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentCoordinator").finish_non_exhaustive()
    }
}
