//! Structured cache keys.
//!
//! A `CacheKey` can only be built through [`CacheKey::list`],
//! [`CacheKey::detail`] or [`CacheKey::new`]. Detail keys always carry a
//! non-blank record id, so an id-less detail entry cannot exist.

use std::fmt;
use tally_core::{QueryScope, RecordId, TransactionKind};

/// Address of one cache entry: a kind namespace plus a list or detail target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Private inner data - cannot be constructed externally
    inner: KeyInner,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct KeyInner {
    kind: TransactionKind,
    target: KeyTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyTarget {
    List,
    Detail(RecordId),
}

impl CacheKey {
    /// Key for the full list of a kind.
    pub fn list(kind: TransactionKind) -> Self {
        Self {
            inner: KeyInner {
                kind,
                target: KeyTarget::List,
            },
        }
    }

    /// Key for a single record.
    ///
    /// Returns `None` when `id` is blank.
    pub fn detail(kind: TransactionKind, id: impl Into<RecordId>) -> Option<Self> {
        let id = id.into();
        if id.is_blank() {
            return None;
        }
        Some(Self {
            inner: KeyInner {
                kind,
                target: KeyTarget::Detail(id),
            },
        })
    }

    /// Build a key from query arguments.
    ///
    /// List keys ignore `id`. Detail keys require a non-blank `id`.
    pub fn new(kind: TransactionKind, scope: QueryScope, id: Option<&RecordId>) -> Option<Self> {
        match scope {
            QueryScope::List => Some(Self::list(kind)),
            QueryScope::Detail => id.and_then(|id| Self::detail(kind, id.clone())),
        }
    }

    pub fn kind(&self) -> TransactionKind {
        self.inner.kind
    }

    pub fn scope(&self) -> QueryScope {
        match self.inner.target {
            KeyTarget::List => QueryScope::List,
            KeyTarget::Detail(_) => QueryScope::Detail,
        }
    }

    /// Record id for detail keys.
    pub fn id(&self) -> Option<&RecordId> {
        match &self.inner.target {
            KeyTarget::List => None,
            KeyTarget::Detail(id) => Some(id),
        }
    }

    /// True when this key belongs to the namespace of `kind`.
    pub fn in_namespace(&self, kind: TransactionKind) -> bool {
        self.inner.kind == kind
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.target {
            KeyTarget::List => write!(f, "{}/LIST", self.inner.kind),
            KeyTarget::Detail(id) => write!(f, "{}/DETAIL/{}", self.inner.kind, id),
        }
    }
}
