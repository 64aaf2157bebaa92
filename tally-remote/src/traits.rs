//! Source traits for the transaction store and the product service.

use async_trait::async_trait;
use tally_core::{
    NewPurchase, NewRental, Product, PurchaseRecord, RecordId, RentalRecord, TallyResult,
};

/// The remote transaction store.
///
/// List calls fail with Network or Server errors, detail and delete calls
/// with NotFound, create calls with Validation or Server.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn list_purchases(&self) -> TallyResult<Vec<PurchaseRecord>>;

    async fn list_rentals(&self) -> TallyResult<Vec<RentalRecord>>;

    async fn get_purchase(&self, id: &RecordId) -> TallyResult<PurchaseRecord>;

    async fn get_rental(&self, id: &RecordId) -> TallyResult<RentalRecord>;

    async fn create_purchase(&self, payload: &NewPurchase) -> TallyResult<PurchaseRecord>;

    async fn create_rental(&self, payload: &NewRental) -> TallyResult<RentalRecord>;

    async fn delete_purchase(&self, id: &RecordId) -> TallyResult<()>;

    async fn delete_rental(&self, id: &RecordId) -> TallyResult<()>;
}

/// The remote product service.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetch one product. Fails with NotFound or Network.
    async fn get_product(&self, product_id: &RecordId) -> TallyResult<Product>;
}
