//! # Document Graph Repository
//!
//! This crate provides the document store interface and the core of the document graph:
//! the snapshot normalizer, the reference graph resolver and the cursor paginator. It also
//! includes an in-memory store implementation, the request context carrying tenant,
//! authorization and deadline, and the `DocumentGraphService` tying them together.

pub mod config;
pub mod context;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod normalizer;
pub mod paginator;
pub mod query;
pub mod resolver;
pub mod service;
pub mod utils;

pub use config::DocGraphConfig;
pub use context::{RequestContext, TenantId};
pub use errors::DocGraphError;
pub use interfaces::DocumentStore;
pub use memory::{MemoryStore, StoreStats};
pub use normalizer::{normalize, normalize_embedded};
pub use paginator::CursorPaginator;
pub use query::{FieldPath, Filter, FilterOp, Limit, Position, Query};
pub use resolver::ReferenceResolver;
pub use service::{CollectionScope, DocumentGraphService};
pub use utils::{clean_include, document_id, validate_segment};
