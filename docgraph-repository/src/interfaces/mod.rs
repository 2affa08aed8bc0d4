//! Interface definitions for document stores.
//!
//! This module defines the abstract `DocumentStore` trait that allows for dependency
//! injection and swappable store backends.

mod document_store;

pub use document_store::DocumentStore;
