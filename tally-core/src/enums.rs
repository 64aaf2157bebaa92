//! Enum types for Tally records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two independent record kinds held by the transaction store.
///
/// Each kind is its own cache namespace: a mutation of one kind never
/// invalidates entries of the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Purchase,
    Rental,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 2] = [TransactionKind::Purchase, TransactionKind::Rental];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "PURCHASE",
            TransactionKind::Rental => "RENTAL",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "purchase" | "purchases" | "buy" => Ok(TransactionKind::Purchase),
            "rental" | "rentals" | "rent" => Ok(TransactionKind::Rental),
            _ => Err(format!("Invalid transaction kind: {}", s)),
        }
    }
}

/// Whether a query targets a whole kind or a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryScope {
    List,
    Detail,
}

impl fmt::Display for QueryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryScope::List => f.write_str("LIST"),
            QueryScope::Detail => f.write_str("DETAIL"),
        }
    }
}

/// Status reported on every transaction.
///
/// The backend does not expose a status yet, so `Completed` is the only
/// value. Do not grow this into a state machine until the backend does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    Completed,
}

/// Closed classification of every failure crossing a remote boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Transport unreachable.
    Network,
    /// Record or product absent.
    NotFound,
    /// Payload rejected.
    Validation,
    /// Remote fault.
    Server,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ErrorKind::Network => "Network",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Validation => "Validation",
            ErrorKind::Server => "Server",
            ErrorKind::Unknown => "Unknown",
        };
        write!(f, "{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::Purchase).unwrap(),
            "\"PURCHASE\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionKind::Rental).unwrap(),
            "\"RENTAL\""
        );
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("purchases".parse::<TransactionKind>(), Ok(TransactionKind::Purchase));
        assert_eq!("Rental".parse::<TransactionKind>(), Ok(TransactionKind::Rental));
        assert!("lease".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn test_status_is_completed() {
        assert_eq!(TransactionStatus::default(), TransactionStatus::Completed);
        assert_eq!(
            serde_json::to_string(&TransactionStatus::Completed).unwrap(),
            "\"COMPLETED\""
        );
    }
}
