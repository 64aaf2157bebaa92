//! Remote collaborators of the transaction engine.
//!
//! The engine only talks to the outside world through [`TransactionSource`]
//! and [`ProductSource`]. [`RestClient`] implements both over HTTP; tests use
//! the in-memory mocks from `tally-test-utils`.

pub mod http;
pub mod traits;

pub use http::{classify_status, RemoteConfig, RestClient};
pub use traits::{ProductSource, TransactionSource};
