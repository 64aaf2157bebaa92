//! In-memory transaction and product sources.
//!
//! Both mocks count every call by operation name and support failure
//! injection, so tests can assert on remote traffic as well as results.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tally_core::{
    NewPurchase, NewRental, Product, PurchaseRecord, RecordId, RentalRecord, ResourceKind,
    TallyError, TallyResult,
};
use tally_remote::{ProductSource, TransactionSource};

/// First id handed out by create calls; fixtures stay below it.
const FIRST_CREATED_ID: u64 = 1000;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// TRANSACTION SOURCE
// ============================================================================

#[derive(Debug, Default)]
struct Ledger {
    purchases: Vec<PurchaseRecord>,
    rentals: Vec<RentalRecord>,
    list_failure: Option<TallyError>,
    mutation_failure: Option<TallyError>,
    calls: HashMap<&'static str, usize>,
}

/// Transaction store backed by two vectors, in insertion order.
#[derive(Debug)]
pub struct MockTransactionSource {
    ledger: RwLock<Ledger>,
    next_id: AtomicU64,
}

impl MockTransactionSource {
    pub fn new() -> Self {
        Self {
            ledger: RwLock::new(Ledger::default()),
            next_id: AtomicU64::new(FIRST_CREATED_ID),
        }
    }

    pub fn insert_purchase(&self, record: PurchaseRecord) {
        write(&self.ledger).purchases.push(record);
    }

    pub fn insert_rental(&self, record: RentalRecord) {
        write(&self.ledger).rentals.push(record);
    }

    /// Make both list calls fail with `error` from now on.
    pub fn fail_lists(&self, error: TallyError) {
        write(&self.ledger).list_failure = Some(error);
    }

    /// Make every create and delete call fail with `error` from now on.
    pub fn fail_mutations(&self, error: TallyError) {
        write(&self.ledger).mutation_failure = Some(error);
    }

    /// Number of calls made to the named operation, e.g. `"list_purchases"`.
    pub fn calls(&self, operation: &str) -> usize {
        read(&self.ledger).calls.get(operation).copied().unwrap_or(0)
    }

    fn record_call(&self, operation: &'static str) -> RwLockWriteGuard<'_, Ledger> {
        let mut ledger = write(&self.ledger);
        *ledger.calls.entry(operation).or_insert(0) += 1;
        ledger
    }

    fn allocate_id(&self) -> RecordId {
        RecordId::new(self.next_id.fetch_add(1, Ordering::Relaxed).to_string())
    }
}

impl Default for MockTransactionSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionSource for MockTransactionSource {
    async fn list_purchases(&self) -> TallyResult<Vec<PurchaseRecord>> {
        let ledger = self.record_call("list_purchases");
        match &ledger.list_failure {
            Some(err) => Err(err.clone()),
            None => Ok(ledger.purchases.clone()),
        }
    }

    async fn list_rentals(&self) -> TallyResult<Vec<RentalRecord>> {
        let ledger = self.record_call("list_rentals");
        match &ledger.list_failure {
            Some(err) => Err(err.clone()),
            None => Ok(ledger.rentals.clone()),
        }
    }

    async fn get_purchase(&self, id: &RecordId) -> TallyResult<PurchaseRecord> {
        let ledger = self.record_call("get_purchase");
        ledger
            .purchases
            .iter()
            .find(|record| &record.id == id)
            .cloned()
            .ok_or_else(|| TallyError::not_found(ResourceKind::Purchase, id.clone()))
    }

    async fn get_rental(&self, id: &RecordId) -> TallyResult<RentalRecord> {
        let ledger = self.record_call("get_rental");
        ledger
            .rentals
            .iter()
            .find(|record| &record.id == id)
            .cloned()
            .ok_or_else(|| TallyError::not_found(ResourceKind::Rental, id.clone()))
    }

    async fn create_purchase(&self, payload: &NewPurchase) -> TallyResult<PurchaseRecord> {
        let mut ledger = self.record_call("create_purchase");
        if let Some(err) = &ledger.mutation_failure {
            return Err(err.clone());
        }
        let record = PurchaseRecord {
            id: self.allocate_id(),
            product_id: payload.product_id.clone(),
            buyer_id: payload.buyer_id.clone(),
            seller_id: payload.seller_id.clone(),
            purchase_date: payload.purchase_date.clone(),
        };
        ledger.purchases.push(record.clone());
        Ok(record)
    }

    async fn create_rental(&self, payload: &NewRental) -> TallyResult<RentalRecord> {
        let mut ledger = self.record_call("create_rental");
        if let Some(err) = &ledger.mutation_failure {
            return Err(err.clone());
        }
        let record = RentalRecord {
            id: self.allocate_id(),
            product_id: payload.product_id.clone(),
            renter_id: payload.renter_id.clone(),
            seller_id: payload.seller_id.clone(),
            rent_option: Some(payload.rent_option.clone()),
            rent_period_start: Some(payload.rent_period_start.clone()),
            rent_period_end: Some(payload.rent_period_end.clone()),
            total_price: payload.total_price.clone(),
            rent_date: None,
        };
        ledger.rentals.push(record.clone());
        Ok(record)
    }

    async fn delete_purchase(&self, id: &RecordId) -> TallyResult<()> {
        let mut ledger = self.record_call("delete_purchase");
        if let Some(err) = &ledger.mutation_failure {
            return Err(err.clone());
        }
        let before = ledger.purchases.len();
        ledger.purchases.retain(|record| &record.id != id);
        if ledger.purchases.len() == before {
            return Err(TallyError::not_found(ResourceKind::Purchase, id.clone()));
        }
        Ok(())
    }

    async fn delete_rental(&self, id: &RecordId) -> TallyResult<()> {
        let mut ledger = self.record_call("delete_rental");
        if let Some(err) = &ledger.mutation_failure {
            return Err(err.clone());
        }
        let before = ledger.rentals.len();
        ledger.rentals.retain(|record| &record.id != id);
        if ledger.rentals.len() == before {
            return Err(TallyError::not_found(ResourceKind::Rental, id.clone()));
        }
        Ok(())
    }
}

// ============================================================================
// PRODUCT SOURCE
// ============================================================================

#[derive(Debug, Default)]
struct Catalog {
    products: HashMap<RecordId, Product>,
    failures: HashMap<RecordId, TallyError>,
    delays: HashMap<RecordId, Duration>,
    calls: HashMap<RecordId, usize>,
    active: usize,
    peak_active: usize,
    completed: Vec<RecordId>,
}

/// Product service keyed by product id.
///
/// Lookups can be delayed per product to control completion order; the mock
/// records that order and the peak number of concurrent lookups.
#[derive(Debug, Default)]
pub struct MockProductSource {
    catalog: RwLock<Catalog>,
}

impl MockProductSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        write(&self.catalog)
            .products
            .insert(product.id.clone(), product);
    }

    /// Make lookups of `product_id` fail with `error`.
    pub fn fail_product(&self, product_id: impl Into<RecordId>, error: TallyError) {
        write(&self.catalog)
            .failures
            .insert(product_id.into(), error);
    }

    /// Hold lookups of `product_id` for `delay` before answering.
    pub fn delay_product(&self, product_id: impl Into<RecordId>, delay: Duration) {
        write(&self.catalog)
            .delays
            .insert(product_id.into(), delay);
    }

    /// Product ids in the order their lookups finished.
    pub fn completion_order(&self) -> Vec<RecordId> {
        read(&self.catalog).completed.clone()
    }

    /// Highest number of lookups that were running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        read(&self.catalog).peak_active
    }

    /// Total number of lookups.
    pub fn calls(&self) -> usize {
        read(&self.catalog).calls.values().sum()
    }

    pub fn calls_for(&self, product_id: impl Into<RecordId>) -> usize {
        read(&self.catalog)
            .calls
            .get(&product_id.into())
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ProductSource for MockProductSource {
    async fn get_product(&self, product_id: &RecordId) -> TallyResult<Product> {
        let delay = {
            let mut catalog = write(&self.catalog);
            *catalog.calls.entry(product_id.clone()).or_insert(0) += 1;
            catalog.active += 1;
            catalog.peak_active = catalog.peak_active.max(catalog.active);
            catalog.delays.get(product_id).copied()
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut catalog = write(&self.catalog);
        catalog.active -= 1;
        catalog.completed.push(product_id.clone());
        if let Some(err) = catalog.failures.get(product_id) {
            return Err(err.clone());
        }
        catalog
            .products
            .get(product_id)
            .cloned()
            .ok_or_else(|| TallyError::not_found(ResourceKind::Product, product_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn test_created_records_are_listed() {
        let source = MockTransactionSource::new();
        source.insert_purchase(fixtures::purchase("1", "10", "2", "3"));

        let created = source
            .create_purchase(&NewPurchase {
                product_id: "11".into(),
                buyer_id: "2".into(),
                seller_id: "3".into(),
                purchase_date: None,
            })
            .await
            .unwrap();

        let ids: Vec<_> = source
            .list_purchases()
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(ids, vec![RecordId::from("1"), created.id]);
        assert_eq!(source.calls("create_purchase"), 1);
        assert_eq!(source.calls("list_purchases"), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let source = MockTransactionSource::new();
        let err = source.delete_rental(&"7".into()).await.unwrap_err();
        assert_eq!(err, TallyError::not_found(ResourceKind::Rental, "7"));
    }

    #[tokio::test]
    async fn test_product_failure_overrides_catalog() {
        let products = MockProductSource::new();
        products.insert(fixtures::product("10", "5"));
        products.fail_product("10", TallyError::validation("boom"));

        assert!(products.get_product(&"10".into()).await.is_err());
        let missing = products.get_product(&"11".into()).await.unwrap_err();
        assert_eq!(missing, TallyError::not_found(ResourceKind::Product, "11"));
        assert_eq!(products.calls(), 2);
        assert_eq!(products.calls_for("10"), 1);
    }
}
