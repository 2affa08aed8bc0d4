//! Raw document snapshots as returned by a store.

use std::fmt;
use std::sync::Arc;

use super::value::{DocumentRef, Fields};

/// How a snapshot reports whether its document exists.
///
/// Stores either answer with a flag or hand back a predicate evaluated on demand; the
/// resolver accepts both.
#[derive(Clone)]
pub enum Existence {
    Flag(bool),
    Probe(Arc<dyn Fn() -> bool + Send + Sync>),
}

impl Existence {
    pub fn check(&self) -> bool {
        match self {
            Existence::Flag(exists) => *exists,
            Existence::Probe(probe) => probe(),
        }
    }
}

impl fmt::Debug for Existence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Existence::Flag(exists) => f.debug_tuple("Flag").field(exists).finish(),
            Existence::Probe(_) => f.write_str("Probe(..)"),
        }
    }
}

/// A raw stored record together with its identity path.
#[derive(Debug, Clone)]
pub struct Snapshot {
    path: String,
    data: Option<Fields>,
    exists: Existence,
}

impl Snapshot {
    /// Snapshot of an existing document.
    pub fn found(path: impl Into<String>, data: Fields) -> Self {
        Self {
            path: path.into(),
            data: Some(data),
            exists: Existence::Flag(true),
        }
    }

    /// Snapshot of a document that does not exist.
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data: None,
            exists: Existence::Flag(false),
        }
    }

    /// Snapshot whose existence is answered by `probe`.
    pub fn with_probe(
        path: impl Into<String>,
        data: Option<Fields>,
        probe: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            data,
            exists: Existence::Probe(Arc::new(probe)),
        }
    }

    pub fn exists(&self) -> bool {
        self.exists.check()
    }

    pub fn data(&self) -> Option<&Fields> {
        self.data.as_ref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn reference(&self) -> DocumentRef {
        DocumentRef::new(self.path.clone())
    }

    pub fn into_data(self) -> Option<Fields> {
        self.data
    }
}
