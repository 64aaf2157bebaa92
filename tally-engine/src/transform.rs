//! Raw record + optional product -> [`Transaction`].
//!
//! Pure and synchronous. The amount is kind-specific:
//! purchases take it from the product's purchase price (no product, no
//! amount), rentals from their own total price regardless of the product.

use tally_core::{
    Product, PurchaseRecord, RecordId, RentalRecord, Transaction, TransactionDetails,
    TransactionKind, TransactionStatus,
};

pub fn transform_purchase(record: PurchaseRecord, product: Option<Product>) -> Transaction {
    let amount = product
        .as_ref()
        .and_then(|product| product.purchase_price.as_ref())
        .and_then(|price| price.parse_amount());

    Transaction {
        id: record.id,
        product_id: record.product_id,
        product,
        amount,
        status: TransactionStatus::Completed,
        details: TransactionDetails::Buy {
            buyer_id: record.buyer_id,
            seller_id: record.seller_id,
            purchase_date: record.purchase_date,
        },
    }
}

pub fn transform_rental(record: RentalRecord, product: Option<Product>) -> Transaction {
    Transaction {
        id: record.id,
        product_id: record.product_id,
        product,
        amount: record.total_price.parse_amount(),
        status: TransactionStatus::Completed,
        details: TransactionDetails::Rent {
            renter_id: record.renter_id,
            seller_id: record.seller_id,
            rent_option: record.rent_option,
            rent_period_start: record.rent_period_start,
            rent_period_end: record.rent_period_end,
            rent_date: record.rent_date,
        },
    }
}

/// A raw record the enrichment coordinator knows how to merge with a product.
pub trait Enrichable: Send + 'static {
    const KIND: TransactionKind;

    fn id(&self) -> &RecordId;

    fn product_id(&self) -> &RecordId;

    fn into_transaction(self, product: Option<Product>) -> Transaction;
}

impl Enrichable for PurchaseRecord {
    const KIND: TransactionKind = TransactionKind::Purchase;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn product_id(&self) -> &RecordId {
        &self.product_id
    }

    fn into_transaction(self, product: Option<Product>) -> Transaction {
        transform_purchase(self, product)
    }
}

impl Enrichable for RentalRecord {
    const KIND: TransactionKind = TransactionKind::Rental;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn product_id(&self) -> &RecordId {
        &self.product_id
    }

    fn into_transaction(self, product: Option<Product>) -> Transaction {
        transform_rental(self, product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::PriceText;
    use tally_test_utils::fixtures;

    #[test]
    fn test_purchase_amount_from_product() {
        let record = fixtures::purchase("1", "10", "2", "3");
        let product = fixtures::product("10", "19.99");

        let tx = transform_purchase(record, Some(product.clone()));

        assert_eq!(tx.amount, Some(19.99));
        assert_eq!(tx.product, Some(product));
        assert_eq!(tx.kind(), TransactionKind::Purchase);
        assert_eq!(tx.status, TransactionStatus::Completed);
    }

    #[test]
    fn test_purchase_without_product_has_no_amount() {
        let tx = transform_purchase(fixtures::purchase("1", "10", "2", "3"), None);

        assert_eq!(tx.amount, None);
        assert_eq!(tx.product, None);
        assert_eq!(tx.product_id.as_str(), "10");
        assert_eq!(tx.counterpart_id().as_str(), "2");
        assert_eq!(tx.seller_id().as_str(), "3");
    }

    #[test]
    fn test_purchase_with_unpriced_product_has_no_amount() {
        let product = Product::new("10");
        let tx = transform_purchase(fixtures::purchase("1", "10", "2", "3"), Some(product));
        assert_eq!(tx.amount, None);
        assert!(tx.product.is_some());
    }

    #[test]
    fn test_rental_amount_ignores_product() {
        let record = fixtures::rental("4", "10", "5", "3", "45.50");
        let with_product = transform_rental(record.clone(), Some(fixtures::product("10", "999")));
        let without_product = transform_rental(record, None);

        assert_eq!(with_product.amount, Some(45.5));
        assert_eq!(without_product.amount, Some(45.5));
        assert_eq!(without_product.kind(), TransactionKind::Rental);
        assert_eq!(without_product.counterpart_id().as_str(), "5");
    }

    #[test]
    fn test_rental_with_unparseable_total() {
        let mut record = fixtures::rental("4", "10", "5", "3", "0");
        record.total_price = PriceText::from("tbd");
        assert_eq!(transform_rental(record, None).amount, None);
    }

    #[test]
    fn test_amount_uses_leading_number_of_price() {
        let tx = transform_purchase(
            fixtures::purchase("1", "10", "2", "3"),
            Some(fixtures::product("10", "12.50 USD")),
        );
        assert_eq!(tx.amount, Some(12.5));

        let mut record = fixtures::rental("4", "10", "5", "3", "0");
        record.total_price = PriceText::from("1,000");
        assert_eq!(transform_rental(record, None).amount, Some(1.0));
    }

    #[test]
    fn test_dates_pass_through_verbatim() {
        let mut record = fixtures::purchase("1", "10", "2", "3");
        record.purchase_date = Some("2024-01-01T10:00:00Z".to_string());
        let tx = transform_purchase(record, None);
        assert_eq!(tx.date(), Some("2024-01-01T10:00:00Z"));
    }
}
