//! # Docgraph API
//!
//! Read-only HTTP-style boundary over the document graph: resolves the tenant of each
//! request, guards collection access, caches responses and dispatches listing, paging
//! and document reads to the `DocumentGraphService`.
//!
//! ## Request flow
//!
//! 1. **Request**: Method, target and headers are parsed into an [`ApiRequest`]
//! 2. **Tenant**: The instance is looked up by host and the bearer token verified
//! 3. **Access**: Collection guards and the privilege policy are applied
//! 4. **Cache**: Unprivileged responses are served from a TTL cache
//! 5. **Handler**: The route is dispatched to the document graph service
//!
//! ## Modules
//!
//! - [`access`]: Collection read guards
//! - [`cache`]: TTL caches for responses and instances
//! - [`config`]: Environment configuration and dependency wiring
//! - [`errors`]: Error types carrying response status codes
//! - [`handler`]: Request dispatch
//! - [`request`]: Request, route and query parameter parsing
//! - [`tenant`]: Instance and principal resolution

pub mod access;
pub mod cache;
pub mod config;
pub mod errors;
pub mod handler;
pub mod request;
pub mod tenant;

pub use config::{ApiConfig, Dependencies};
pub use errors::ApiError;
pub use handler::{ApiReply, ApiResponse, DocGraphApi};
pub use request::{ApiRequest, Method};

use thiserror::Error;

/// Errors that can occur during server initialization or execution.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] ApiError),

    /// Failed to read requests or write replies.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
