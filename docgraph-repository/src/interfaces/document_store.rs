//! Document store trait definition.
//!
//! This module defines the abstract interface the resolver and paginator read through,
//! decoupling them from any specific store transport.

use async_trait::async_trait;
use docgraph_shared::{DocumentRef, Snapshot};

use crate::errors::DocGraphError;
use crate::query::Query;

/// Abstracts the underlying document store.
///
/// Implementations are injected into `ReferenceResolver`, `CursorPaginator` and
/// `DocumentGraphService`. Tests use hand written implementations to inject failures and
/// latency.
///
/// # Missing documents
///
/// `fetch` reports a missing document as a snapshot whose `exists()` is false. Errors are
/// reserved for transport, permission and query failures.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the current snapshot of the referenced document.
    ///
    /// # Arguments
    ///
    /// * `reference` - Pointer to the document's location
    ///
    /// # Returns
    ///
    /// * `Ok(Snapshot)` - The snapshot, possibly of a missing document
    /// * `Err(DocGraphError)` - If the store could not be read
    async fn fetch(&self, reference: &DocumentRef) -> Result<Snapshot, DocGraphError>;

    /// Count the documents matching `query`, honoring its bounds and window.
    ///
    /// # Arguments
    ///
    /// * `query` - The query to aggregate
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Number of matching documents
    /// * `Err(DocGraphError)` - If the aggregation fails
    async fn count(&self, query: &Query) -> Result<u64, DocGraphError>;

    /// Execute `query` and return the matching snapshots in query order.
    ///
    /// # Arguments
    ///
    /// * `query` - The query to execute
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Snapshot>)` - Matching snapshots, all existing
    /// * `Err(DocGraphError)` - If the query fails
    async fn execute(&self, query: &Query) -> Result<Vec<Snapshot>, DocGraphError>;
}
