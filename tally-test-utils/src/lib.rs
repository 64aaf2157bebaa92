//! Tally Test Utilities
//!
//! Centralized test infrastructure for the Tally workspace:
//! - In-memory mock transaction and product sources with call counters
//! - Failure injection per product and per operation group
//! - Fixtures for common records
//! - Proptest generators for records and prices

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use mocks::{MockProductSource, MockTransactionSource};

// Re-export core types for convenience
pub use tally_core::{
    CreatePayload, ErrorKind, NewPurchase, NewRental, PriceText, Product, PurchaseRecord,
    RecordId, RemoteError, RentalRecord, ResourceKind, TallyError, TallyResult, Transaction,
    TransactionKind,
};
