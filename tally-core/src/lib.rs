//! Tally Core - Transaction Types
//!
//! Pure data structures with no behavior beyond parsing and display.
//! All other crates depend on this. No I/O and no business logic live here.

pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;

pub use entities::*;
pub use enums::*;
pub use error::*;
pub use identity::*;
