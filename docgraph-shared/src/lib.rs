//! # Docgraph Shared
//!
//! This crate defines the data structures shared across the document graph crates.
//! It includes the stored value model, documents and snapshots, field descriptors,
//! resolution policies and the cursor page types returned to consumers.

pub mod types;

pub use types::cursor::Cursor;
pub use types::document::Document;
pub use types::page::{Edge, Page, PageInfo};
pub use types::request::{
    Direction, ListRequest, OrderBy, PageRequest, PageStart, ResolvePolicy,
};
pub use types::schema::{DocumentSchema, FieldDescriptor, FieldKind, SchemaRegistry};
pub use types::snapshot::{Existence, Snapshot};
pub use types::value::{DocumentRef, Fields, Timestamp, Value};
