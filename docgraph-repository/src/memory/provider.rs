//! In-memory store provider.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard};

use async_trait::async_trait;
use docgraph_shared::{DocumentRef, Fields, Snapshot};
use tracing::{debug, info};

use crate::errors::DocGraphError;
use crate::interfaces::DocumentStore;
use crate::memory::matcher;
use crate::query::Query;

/// Number of store calls served, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub fetches: u64,
    pub counts: u64,
    pub executions: u64,
}

#[derive(Default)]
struct Counters {
    fetches: AtomicU64,
    counts: AtomicU64,
    executions: AtomicU64,
}

/// Document store keeping every document in memory, keyed by identity path.
///
/// A collection holds the documents exactly one path segment below it, so
/// `instances/main/products/p1` belongs to `instances/main/products`.
///
/// # Example
///
/// ```
/// use docgraph_repository::MemoryStore;
///
/// let store = MemoryStore::from_json(r#"{
///     "products/p1": {"name": "Chair", "ownerRef": {"$ref": "users/u1"}},
///     "users/u1": {"name": "Ada"}
/// }"#).expect("valid seed");
///
/// assert_eq!(store.len(), 2);
/// ```
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<String, Fields>>,
    counters: Counters,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a JSON object mapping document paths to their fields.
    pub fn from_json(json: &str) -> Result<Self, DocGraphError> {
        let documents: BTreeMap<String, Fields> = serde_json::from_str(json)?;

        info!(documents = documents.len(), "Seeded in-memory document store");

        Ok(Self {
            documents: RwLock::new(documents),
            counters: Counters::default(),
        })
    }

    /// Insert or replace the document at `path`.
    pub fn insert(&self, path: impl Into<String>, fields: Fields) {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        documents.insert(path.into(), fields);
    }

    /// Remove the document at `path`, returning its fields.
    pub fn remove(&self, path: &str) -> Option<Fields> {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        documents.remove(path)
    }

    pub fn len(&self) -> usize {
        self.documents
            .read()
            .map(|documents| documents.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls served so far.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            counts: self.counters.counts.load(Ordering::Relaxed),
            executions: self.counters.executions.load(Ordering::Relaxed),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Fields>>, DocGraphError> {
        self.documents
            .read()
            .map_err(|e| DocGraphError::connection(format!("Store lock poisoned: {}", e)))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch(&self, reference: &DocumentRef) -> Result<Snapshot, DocGraphError> {
        self.counters.fetches.fetch_add(1, Ordering::Relaxed);

        let documents = self.read()?;
        let snapshot = match documents.get(reference.path()) {
            Some(fields) => Snapshot::found(reference.path(), fields.clone()),
            None => Snapshot::missing(reference.path()),
        };

        debug!(path = %reference, exists = snapshot.exists(), "Fetched document");

        Ok(snapshot)
    }

    async fn count(&self, query: &Query) -> Result<u64, DocGraphError> {
        self.counters.counts.fetch_add(1, Ordering::Relaxed);

        let documents = self.read()?;
        let rows = matcher::evaluate(query, &documents)?;

        Ok(rows.len() as u64)
    }

    async fn execute(&self, query: &Query) -> Result<Vec<Snapshot>, DocGraphError> {
        self.counters.executions.fetch_add(1, Ordering::Relaxed);

        let documents = self.read()?;
        let rows = matcher::evaluate(query, &documents)?;

        debug!(
            collection = %query.collection_path(),
            matches = rows.len(),
            "Executed query"
        );

        Ok(rows
            .into_iter()
            .map(|row| Snapshot::found(row.path, row.fields.clone()))
            .collect())
    }
}
