//! Error types for Tally operations

use crate::{ErrorKind, RecordId};
use std::fmt;
use thiserror::Error;

/// What a remote lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Purchase,
    Rental,
    Product,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ResourceKind::Purchase => "Purchase",
            ResourceKind::Rental => "Rental",
            ResourceKind::Product => "Product",
        };
        write!(f, "{}", value)
    }
}

/// Failures reported by the transaction store or the product service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Network unreachable: {reason}")]
    Network { reason: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: ResourceKind, id: RecordId },

    #[error("Payload rejected: {reason}")]
    Validation { reason: String },

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected remote failure: {reason}")]
    Unknown { reason: String },
}

impl RemoteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RemoteError::Network { .. } => ErrorKind::Network,
            RemoteError::NotFound { .. } => ErrorKind::NotFound,
            RemoteError::Validation { .. } => ErrorKind::Validation,
            RemoteError::Server { .. } => ErrorKind::Server,
            RemoteError::Unknown { .. } => ErrorKind::Unknown,
        }
    }
}

/// Cache layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Background fetch for {key} aborted: {reason}")]
    FetchAborted { key: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or TALLY_CONFIG)")]
    MissingConfigPath,

    #[error("Failed to read config file: {reason}")]
    Io { reason: String },

    #[error("Failed to parse config TOML: {reason}")]
    Parse { reason: String },

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Master error type for all Tally errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TallyError {
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl TallyError {
    /// Classify into the closed [`ErrorKind`] taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TallyError::Remote(err) => err.kind(),
            TallyError::Cache(_) | TallyError::Config(_) => ErrorKind::Unknown,
        }
    }

    pub fn not_found(resource: ResourceKind, id: impl Into<RecordId>) -> Self {
        RemoteError::NotFound {
            resource,
            id: id.into(),
        }
        .into()
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        RemoteError::Validation {
            reason: reason.into(),
        }
        .into()
    }
}

/// Result type alias for Tally operations.
pub type TallyResult<T> = Result<T, TallyError>;

// =============================================================================
// TESTS
// =============================================================================
