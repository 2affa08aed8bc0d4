//! Error types for the document graph repository.
//!
//! This module provides a unified error type for all store, resolution and pagination
//! operations.

mod docgraph_error;

pub use docgraph_error::DocGraphError;
