//! Error types for the document graph API.

use docgraph_repository::DocGraphError;
use thiserror::Error;

/// Errors surfaced at the request boundary.
///
/// Each variant maps to the HTTP status a hosting layer should answer with.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// Malformed request (missing ids, bad parameters).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The caller may not read the collection, or the request lacks a tenant.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// No route, instance or document matched.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Only GET, HEAD and OPTIONS are served.
    #[error("Unsupported method: {0}")]
    MethodNotAllowed(String),

    /// The matched instance document is unusable.
    #[error("Malformed instance: {0}")]
    MalformedInstance(String),

    /// Token verification failed.
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error from the document graph core.
    #[error(transparent)]
    Repository(#[from] DocGraphError),
}

impl ApiError {
    /// Create a bad request error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Create an unauthorized error.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a malformed instance error.
    pub fn malformed_instance(msg: impl Into<String>) -> Self {
        Self::MalformedInstance(msg.into())
    }

    /// Create an authentication error.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) | ApiError::AuthError(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::MethodNotAllowed(_) => 405,
            ApiError::MalformedInstance(_) => 502,
            ApiError::Repository(err) => match err {
                DocGraphError::ValidationError(_) => 400,
                DocGraphError::PermissionDenied(_) => 401,
                DocGraphError::NotFound(_) => 404,
                DocGraphError::Timeout { .. } => 504,
                _ => 500,
            },
        }
    }

    /// Short reason phrase sent back to callers.
    pub fn status_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::MethodNotAllowed(msg)
            | ApiError::MalformedInstance(msg)
            | ApiError::AuthError(msg) => msg.clone(),
            ApiError::Repository(err) => match err {
                DocGraphError::ValidationError(msg)
                | DocGraphError::NotFound(msg)
                | DocGraphError::PermissionDenied(msg) => msg.clone(),
                other => other.to_string(),
            },
        }
    }
}
