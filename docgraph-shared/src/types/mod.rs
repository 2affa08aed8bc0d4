//! This module defines the core data structures used across the document graph.
//! Stored values and references live in `value`, resolved output in `document` and `page`.

pub mod cursor;
pub mod document;
pub mod page;
pub mod request;
pub mod schema;
pub mod snapshot;
pub mod value;

pub use document::Document;
pub use value::{DocumentRef, Fields, Timestamp, Value};
