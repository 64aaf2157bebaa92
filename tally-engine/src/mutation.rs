//! Mutation gateway.
//!
//! Create and delete calls go straight to the transaction store. Only a
//! successful call invalidates the cache, and then the whole namespace of the
//! mutated kind. Cached data is never edited optimistically.

use std::sync::Arc;

use tally_core::{CreatePayload, RawRecord, RecordId, TallyError, TallyResult, TransactionKind};
use tally_remote::TransactionSource;
use tally_storage::QueryCache;

use crate::enrichment::{EnrichmentCoordinator, QueryData};

/// A write against the transaction store.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create(CreatePayload),
    Delete(RecordId),
}

/// What a successful mutation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Created(RawRecord),
    Deleted { kind: TransactionKind, id: RecordId },
}

#[derive(Clone)]
pub struct MutationGateway {
    transactions: Arc<dyn TransactionSource>,
    cache: QueryCache<QueryData, EnrichmentCoordinator>,
}

impl MutationGateway {
    pub fn new(
        transactions: Arc<dyn TransactionSource>,
        cache: QueryCache<QueryData, EnrichmentCoordinator>,
    ) -> Self {
        Self {
            transactions,
            cache,
        }
    }

    /// Apply a mutation of `kind`, invalidating that kind's cache namespace
    /// on success. On failure the cache is left untouched.
    pub async fn mutate(
        &self,
        kind: TransactionKind,
        mutation: Mutation,
    ) -> TallyResult<MutationOutcome> {
        let outcome = match mutation {
            Mutation::Create(payload) => self
                .create(kind, &payload)
                .await
                .map(MutationOutcome::Created),
            Mutation::Delete(id) => self
                .delete(kind, &id)
                .await
                .map(|()| MutationOutcome::Deleted { kind, id }),
        };

        match &outcome {
            Ok(result) => {
                let invalidated = self.cache.invalidate_namespace(kind).await;
                tracing::info!(%kind, ?result, invalidated, "Mutation applied");
            }
            Err(err) => {
                tracing::warn!(%kind, error = %err, "Mutation failed, cache untouched");
            }
        }
        outcome
    }

    async fn create(
        &self,
        kind: TransactionKind,
        payload: &CreatePayload,
    ) -> TallyResult<RawRecord> {
        if payload.kind() != kind {
            return Err(TallyError::validation(format!(
                "{} payload submitted as a {} mutation",
                payload.kind(),
                kind
            )));
        }
        match payload {
            CreatePayload::Purchase(new) => self
                .transactions
                .create_purchase(new)
                .await
                .map(RawRecord::from),
            CreatePayload::Rental(new) => self
                .transactions
                .create_rental(new)
                .await
                .map(RawRecord::from),
        }
    }

    async fn delete(&self, kind: TransactionKind, id: &RecordId) -> TallyResult<()> {
        if id.is_blank() {
            return Err(TallyError::validation("delete requires a record id"));
        }
        match kind {
            TransactionKind::Purchase => self.transactions.delete_purchase(id).await,
            TransactionKind::Rental => self.transactions.delete_rental(id).await,
        }
    }
}

impl std::fmt::Debug for MutationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationGateway")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{ErrorKind, NewPurchase, NewRental, PriceText, RemoteError, ResourceKind};
    use tally_storage::{CacheKey, EntryState, FreshnessPolicy};
    use tally_test_utils::{fixtures, MockProductSource, MockTransactionSource};

    struct Harness {
        gateway: MutationGateway,
        cache: QueryCache<QueryData, EnrichmentCoordinator>,
        transactions: Arc<MockTransactionSource>,
    }

    fn harness() -> Harness {
        let transactions = Arc::new(MockTransactionSource::new());
        transactions.insert_purchase(fixtures::purchase("5", "10", "2", "3"));
        transactions.insert_rental(fixtures::rental("6", "10", "2", "3", "20"));
        let products = Arc::new(MockProductSource::new());
        let coordinator = Arc::new(EnrichmentCoordinator::new(transactions.clone(), products));
        let cache = QueryCache::new(coordinator, FreshnessPolicy::default());
        Harness {
            gateway: MutationGateway::new(transactions.clone(), cache.clone()),
            cache,
            transactions,
        }
    }

    fn new_purchase() -> NewPurchase {
        NewPurchase {
            product_id: "10".into(),
            buyer_id: "2".into(),
            seller_id: "3".into(),
            purchase_date: Some("2024-03-01".to_string()),
        }
    }

    #[tokio::test]
    async fn test_delete_success_invalidates_namespace() {
        let h = harness();
        let list = CacheKey::list(TransactionKind::Purchase);
        let detail = CacheKey::detail(TransactionKind::Purchase, "5").unwrap();
        let rentals = CacheKey::list(TransactionKind::Rental);
        h.cache.read(&list).await;
        h.cache.read(&detail).await;
        h.cache.read(&rentals).await;

        let outcome = h
            .gateway
            .mutate(TransactionKind::Purchase, Mutation::Delete("5".into()))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            MutationOutcome::Deleted {
                kind: TransactionKind::Purchase,
                id: "5".into()
            }
        );
        assert_eq!(h.cache.entry_state(&list).await, EntryState::Stale);
        assert_eq!(h.cache.entry_state(&detail).await, EntryState::Stale);
        assert_eq!(h.cache.entry_state(&rentals).await, EntryState::Fresh);
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_cache_untouched() {
        let h = harness();
        let list = CacheKey::list(TransactionKind::Purchase);
        h.cache.read(&list).await;

        let err = h
            .gateway
            .mutate(TransactionKind::Purchase, Mutation::Delete("404".into()))
            .await
            .unwrap_err();

        assert_eq!(err, TallyError::not_found(ResourceKind::Purchase, "404"));
        assert_eq!(h.cache.entry_state(&list).await, EntryState::Fresh);
    }

    #[tokio::test]
    async fn test_create_returns_record_and_invalidates() {
        let h = harness();
        let list = CacheKey::list(TransactionKind::Purchase);
        h.cache.read(&list).await;

        let outcome = h
            .gateway
            .mutate(
                TransactionKind::Purchase,
                Mutation::Create(CreatePayload::Purchase(new_purchase())),
            )
            .await
            .unwrap();

        match outcome {
            MutationOutcome::Created(RawRecord::Purchase(record)) => {
                assert_eq!(record.product_id.as_str(), "10");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(h.cache.entry_state(&list).await, EntryState::Stale);
        assert_eq!(h.transactions.calls("create_purchase"), 1);
    }

    #[tokio::test]
    async fn test_create_rejection_propagates() {
        let h = harness();
        let list = CacheKey::list(TransactionKind::Rental);
        h.cache.read(&list).await;
        h.transactions.fail_mutations(
            RemoteError::Validation {
                reason: "rent period inverted".into(),
            }
            .into(),
        );

        let payload = CreatePayload::Rental(NewRental {
            product_id: "10".into(),
            renter_id: "2".into(),
            seller_id: "3".into(),
            rent_option: "DAILY".into(),
            rent_period_start: "2024-02-03".into(),
            rent_period_end: "2024-02-01".into(),
            total_price: PriceText::from("10"),
        });
        let err = h
            .gateway
            .mutate(TransactionKind::Rental, Mutation::Create(payload))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(h.cache.entry_state(&list).await, EntryState::Fresh);
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_rejected_locally() {
        let h = harness();

        let err = h
            .gateway
            .mutate(
                TransactionKind::Rental,
                Mutation::Create(CreatePayload::Purchase(new_purchase())),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(h.transactions.calls("create_purchase"), 0);
        assert_eq!(h.transactions.calls("create_rental"), 0);
    }

    #[tokio::test]
    async fn test_blank_delete_is_rejected_locally() {
        let h = harness();

        let err = h
            .gateway
            .mutate(TransactionKind::Purchase, Mutation::Delete(" ".into()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(h.transactions.calls("delete_purchase"), 0);
    }
}
