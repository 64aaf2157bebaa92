//! Tally Engine - Transaction Aggregation & Enrichment
//!
//! Reads purchases and rentals from the transaction store, attaches product
//! data to each record, and serves the result through a stale-while-revalidate
//! cache. Mutations go through a gateway that invalidates the affected kind.
//!
//! ```ignore
//! let service = TransactionService::new(transactions, products, FreshnessPolicy::default());
//!
//! let purchases = service.list(TransactionKind::Purchase).await;
//! service
//!     .mutate(TransactionKind::Purchase, Mutation::Delete("5".into()))
//!     .await?;
//! ```

pub mod enrichment;
pub mod mutation;
pub mod service;
pub mod transform;

pub use enrichment::{EnrichmentCoordinator, QueryData};
pub use mutation::{Mutation, MutationGateway, MutationOutcome};
pub use service::{Query, TransactionService};
pub use transform::{transform_purchase, transform_rental, Enrichable};
