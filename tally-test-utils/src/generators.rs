//! Proptest generators.

use proptest::prelude::*;
use tally_core::{PriceText, PurchaseRecord, RecordId, RentalRecord};

pub fn arb_record_id() -> impl Strategy<Value = RecordId> {
    prop_oneof![
        (1i64..100_000).prop_map(RecordId::from),
        "[a-z0-9]{1,12}".prop_map(RecordId::from),
    ]
}

/// Prices that parse, paired with their expected amount.
pub fn arb_valid_price() -> impl Strategy<Value = (PriceText, f64)> {
    (0u32..1_000_000, 0u32..100).prop_map(|(whole, cents)| {
        let text = format!("{}.{:02}", whole, cents);
        let amount = text.parse::<f64>().unwrap_or_default();
        (PriceText::new(text), amount)
    })
}

/// Any price text, parseable or not.
pub fn arb_price_text() -> impl Strategy<Value = PriceText> {
    prop_oneof![
        arb_valid_price().prop_map(|(text, _)| text),
        "[a-z ]{0,8}".prop_map(PriceText::new),
    ]
}

prop_compose! {
    pub fn arb_purchase_record()(
        id in arb_record_id(),
        product_id in arb_record_id(),
        buyer_id in arb_record_id(),
        seller_id in arb_record_id(),
        purchase_date in proptest::option::of("2024-0[1-9]-[12][0-9]"),
    ) -> PurchaseRecord {
        PurchaseRecord { id, product_id, buyer_id, seller_id, purchase_date }
    }
}

prop_compose! {
    pub fn arb_rental_record()(
        id in arb_record_id(),
        product_id in arb_record_id(),
        renter_id in arb_record_id(),
        seller_id in arb_record_id(),
        total_price in arb_price_text(),
    ) -> RentalRecord {
        RentalRecord {
            id,
            product_id,
            renter_id,
            seller_id,
            rent_option: Some("DAILY".to_string()),
            rent_period_start: None,
            rent_period_end: None,
            total_price,
            rent_date: None,
        }
    }
}
