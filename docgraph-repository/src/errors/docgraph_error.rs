//! Document graph error types.
//!
//! This module defines the unified error type for all document graph operations, including
//! collaborator failures surfaced by a store and request level failures raised by the core.

use std::time::Duration;

use thiserror::Error;

/// Unified errors from document graph operations.
///
/// Used by the `DocumentStore` trait, the resolver, the paginator and `DocumentGraphService`.
/// Missing documents are not errors inside the resolver (they resolve to nothing); `NotFound`
/// is only raised where a caller asked for one specific document.
#[derive(Debug, Clone, Error)]
pub enum DocGraphError {
    /// Validation error (e.g., empty ids, too many included documents).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The requested document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller may not read the requested collection or document.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Failed to establish connection to the store.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Fetching a referenced or requested document failed.
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// Executing or counting a query failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Failed to parse stored or seeded data.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A store call exceeded its deadline.
    #[error("Timed out after {}ms: {operation}", elapsed.as_millis())]
    Timeout { operation: String, elapsed: Duration },

    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl DocGraphError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a permission denied error.
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a fetch error.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::FetchError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed,
        }
    }

    /// Create an unknown error.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Returns true for deadline failures, which callers may retry or answer from cache.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<serde_json::Error> for DocGraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}
