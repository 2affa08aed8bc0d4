//! In-memory implementation of the document store.
//!
//! This module provides a concrete implementation of `DocumentStore` that keeps documents
//! in process. It backs local runs seeded from JSON and the test suites.

mod matcher;
mod provider;

pub use provider::{MemoryStore, StoreStats};
