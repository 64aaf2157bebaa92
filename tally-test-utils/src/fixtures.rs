//! Record fixtures.

use tally_core::{PriceText, Product, PurchaseRecord, RecordId, RentalRecord};

pub fn purchase(
    id: impl Into<RecordId>,
    product_id: impl Into<RecordId>,
    buyer_id: impl Into<RecordId>,
    seller_id: impl Into<RecordId>,
) -> PurchaseRecord {
    PurchaseRecord {
        id: id.into(),
        product_id: product_id.into(),
        buyer_id: buyer_id.into(),
        seller_id: seller_id.into(),
        purchase_date: None,
    }
}

pub fn purchase_dated(
    id: impl Into<RecordId>,
    product_id: impl Into<RecordId>,
    buyer_id: impl Into<RecordId>,
    seller_id: impl Into<RecordId>,
    purchase_date: &str,
) -> PurchaseRecord {
    PurchaseRecord {
        purchase_date: Some(purchase_date.to_string()),
        ..purchase(id, product_id, buyer_id, seller_id)
    }
}

pub fn rental(
    id: impl Into<RecordId>,
    product_id: impl Into<RecordId>,
    renter_id: impl Into<RecordId>,
    seller_id: impl Into<RecordId>,
    total_price: &str,
) -> RentalRecord {
    RentalRecord {
        id: id.into(),
        product_id: product_id.into(),
        renter_id: renter_id.into(),
        seller_id: seller_id.into(),
        rent_option: Some("DAILY".to_string()),
        rent_period_start: Some("2024-02-01".to_string()),
        rent_period_end: Some("2024-02-03".to_string()),
        total_price: PriceText::from(total_price),
        rent_date: Some("2024-01-30".to_string()),
    }
}

pub fn product(id: impl Into<RecordId>, purchase_price: &str) -> Product {
    Product::new(id)
        .with_name("Test product")
        .with_purchase_price(purchase_price)
}
