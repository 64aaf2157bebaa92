//! Record and transaction types.
//!
//! Raw records mirror the remote store's wire shape. [`Transaction`] is the
//! read-time projection handed to consumers; it is never persisted.

use crate::{PriceText, RecordId, TransactionKind, TransactionStatus};
use serde::{Deserialize, Serialize};

// ============================================================================
// RAW RECORDS
// ============================================================================

/// A purchase as returned by the transaction store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub id: RecordId,
    #[serde(rename = "product", alias = "productId")]
    pub product_id: RecordId,
    #[serde(rename = "buyer", alias = "buyerId")]
    pub buyer_id: RecordId,
    #[serde(rename = "seller", alias = "sellerId")]
    pub seller_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
}

/// A rental as returned by the transaction store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalRecord {
    pub id: RecordId,
    #[serde(rename = "product", alias = "productId")]
    pub product_id: RecordId,
    #[serde(rename = "renter", alias = "renterId")]
    pub renter_id: RecordId,
    #[serde(rename = "seller", alias = "sellerId")]
    pub seller_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_period_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_period_end: Option<String>,
    pub total_price: PriceText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_date: Option<String>,
}

/// Either kind of raw record, as returned by create calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRecord {
    Purchase(PurchaseRecord),
    Rental(RentalRecord),
}

impl RawRecord {
    pub fn id(&self) -> &RecordId {
        match self {
            RawRecord::Purchase(record) => &record.id,
            RawRecord::Rental(record) => &record.id,
        }
    }

    pub fn product_id(&self) -> &RecordId {
        match self {
            RawRecord::Purchase(record) => &record.product_id,
            RawRecord::Rental(record) => &record.product_id,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        match self {
            RawRecord::Purchase(_) => TransactionKind::Purchase,
            RawRecord::Rental(_) => TransactionKind::Rental,
        }
    }
}

impl From<PurchaseRecord> for RawRecord {
    fn from(record: PurchaseRecord) -> Self {
        RawRecord::Purchase(record)
    }
}

impl From<RentalRecord> for RawRecord {
    fn from(record: RentalRecord) -> Self {
        RawRecord::Rental(record)
    }
}

// ============================================================================
// PRODUCT
// ============================================================================

/// Denormalized product data attached to a transaction during enrichment.
///
/// Only the fields the engine reads are typed; every other attribute the
/// product service returns is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<PriceText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_price: Option<PriceText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        rename = "seller",
        alias = "sellerId",
        skip_serializing_if = "Option::is_none"
    )]
    pub seller_id: Option<RecordId>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Product {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            purchase_price: None,
            rent_price: None,
            category: None,
            seller_id: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_purchase_price(mut self, price: impl Into<PriceText>) -> Self {
        self.purchase_price = Some(price.into());
        self
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// Kind-specific counterpart ids and dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransactionDetails {
    #[serde(rename = "BUY", rename_all = "camelCase")]
    Buy {
        buyer_id: RecordId,
        seller_id: RecordId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        purchase_date: Option<String>,
    },
    #[serde(rename = "RENT", rename_all = "camelCase")]
    Rent {
        renter_id: RecordId,
        seller_id: RecordId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rent_option: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rent_period_start: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rent_period_end: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rent_date: Option<String>,
    },
}

/// A raw record merged with its (optional) product.
///
/// `product_id` is always present, even when `product` is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: RecordId,
    pub product_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub status: TransactionStatus,
    #[serde(flatten)]
    pub details: TransactionDetails,
}

impl Transaction {
    pub fn kind(&self) -> TransactionKind {
        match self.details {
            TransactionDetails::Buy { .. } => TransactionKind::Purchase,
            TransactionDetails::Rent { .. } => TransactionKind::Rental,
        }
    }

    pub fn seller_id(&self) -> &RecordId {
        match &self.details {
            TransactionDetails::Buy { seller_id, .. } => seller_id,
            TransactionDetails::Rent { seller_id, .. } => seller_id,
        }
    }

    /// The buyer for purchases, the renter for rentals.
    pub fn counterpart_id(&self) -> &RecordId {
        match &self.details {
            TransactionDetails::Buy { buyer_id, .. } => buyer_id,
            TransactionDetails::Rent { renter_id, .. } => renter_id,
        }
    }

    /// Date the transaction happened, as sent by the store.
    pub fn date(&self) -> Option<&str> {
        match &self.details {
            TransactionDetails::Buy { purchase_date, .. } => purchase_date.as_deref(),
            TransactionDetails::Rent { rent_date, .. } => rent_date.as_deref(),
        }
    }
}

// ============================================================================
// CREATE PAYLOADS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchase {
    #[serde(rename = "product")]
    pub product_id: RecordId,
    #[serde(rename = "buyer")]
    pub buyer_id: RecordId,
    #[serde(rename = "seller")]
    pub seller_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRental {
    #[serde(rename = "product")]
    pub product_id: RecordId,
    #[serde(rename = "renter")]
    pub renter_id: RecordId,
    #[serde(rename = "seller")]
    pub seller_id: RecordId,
    pub rent_option: String,
    pub rent_period_start: String,
    pub rent_period_end: String,
    pub total_price: PriceText,
}

/// Body of a create mutation. The variant fixes the record kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreatePayload {
    Purchase(NewPurchase),
    Rental(NewRental),
}

impl CreatePayload {
    pub fn kind(&self) -> TransactionKind {
        match self {
            CreatePayload::Purchase(_) => TransactionKind::Purchase,
            CreatePayload::Rental(_) => TransactionKind::Rental,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_purchase_record_from_wire_shape() {
        let record: PurchaseRecord = serde_json::from_value(json!({
            "id": 1,
            "product": 10,
            "buyer": 2,
            "seller": 3,
            "purchaseDate": "2024-01-01"
        }))
        .unwrap();

        assert_eq!(record.id.as_str(), "1");
        assert_eq!(record.product_id.as_str(), "10");
        assert_eq!(record.buyer_id.as_str(), "2");
        assert_eq!(record.seller_id.as_str(), "3");
        assert_eq!(record.purchase_date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_rental_record_accepts_id_suffixed_names() {
        let record: RentalRecord = serde_json::from_value(json!({
            "id": "r-1",
            "productId": "p-9",
            "renterId": "u-2",
            "sellerId": "u-3",
            "rentOption": "DAILY",
            "rentPeriodStart": "2024-02-01",
            "rentPeriodEnd": "2024-02-03",
            "totalPrice": "45.00",
            "rentDate": "2024-01-30"
        }))
        .unwrap();

        assert_eq!(record.product_id.as_str(), "p-9");
        assert_eq!(record.total_price.parse_amount(), Some(45.0));
    }

    #[test]
    fn test_product_keeps_unknown_attributes() {
        let product: Product = serde_json::from_value(json!({
            "id": 10,
            "name": "Lamp",
            "purchasePrice": "20.5",
            "images": ["a.png"]
        }))
        .unwrap();

        assert_eq!(product.name.as_deref(), Some("Lamp"));
        assert_eq!(product.extra.get("images"), Some(&json!(["a.png"])));
    }

    #[test]
    fn test_transaction_serializes_tagged() {
        let tx = Transaction {
            id: RecordId::from("1"),
            product_id: RecordId::from("10"),
            product: None,
            amount: None,
            status: TransactionStatus::Completed,
            details: TransactionDetails::Buy {
                buyer_id: RecordId::from("2"),
                seller_id: RecordId::from("3"),
                purchase_date: Some("2024-01-01".to_string()),
            },
        };

        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], "BUY");
        assert_eq!(value["productId"], "10");
        assert_eq!(value["buyerId"], "2");
        assert_eq!(value["status"], "COMPLETED");
        assert!(value.get("product").is_none());
        assert_eq!(tx.kind(), TransactionKind::Purchase);
        assert_eq!(tx.date(), Some("2024-01-01"));
    }

    #[test]
    fn test_create_payload_kind() {
        let payload = CreatePayload::Purchase(NewPurchase {
            product_id: "10".into(),
            buyer_id: "2".into(),
            seller_id: "3".into(),
            purchase_date: None,
        });
        assert_eq!(payload.kind(), TransactionKind::Purchase);
    }
}
