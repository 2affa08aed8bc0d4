//! Inbound request model.
//!
//! - [`ApiRequest`]: method, target and headers of one call
//! - [`Route`]: which collection or document the call addresses
//! - [`CollectionParams`]: query parameters controlling listing and resolution

mod params;
mod route;

pub use params::CollectionParams;
pub use route::Route;

use std::collections::HashMap;

use url::Url;

use crate::errors::ApiError;

/// Base used to parse request targets, which carry no scheme or host of their own.
const TARGET_BASE: &str = "http://localhost";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Options,
    Other,
}

impl Method {
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            _ => Method::Other,
        }
    }
}

/// A request addressed to the document graph API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    target: String,
    path: String,
    query: Vec<(String, String)>,
    headers: HashMap<String, String>,
}

impl ApiRequest {
    /// Parse a GET request for `target` (path plus optional query string).
    ///
    /// # Example
    ///
    /// ```
    /// use docgraph_api::request::ApiRequest;
    ///
    /// let request = ApiRequest::get("/api/all/products?page=true&omit=owner")
    ///     .unwrap()
    ///     .with_header("Host", "shop.example:3000");
    ///
    /// assert_eq!(request.path(), "/api/all/products");
    /// assert_eq!(request.host(), "shop.example:3000");
    /// ```
    pub fn get(target: &str) -> Result<Self, ApiError> {
        Self::new(Method::Get, target)
    }

    pub fn new(method: Method, target: &str) -> Result<Self, ApiError> {
        if !target.starts_with('/') {
            return Err(ApiError::bad_request(format!(
                "Request target must start with '/': {}",
                target
            )));
        }

        let url = Url::parse(&format!("{}{}", TARGET_BASE, target))
            .map_err(|e| ApiError::bad_request(format!("Invalid request target: {}", e)))?;

        Ok(Self {
            method,
            target: target.to_string(),
            path: url.path().to_string(),
            query: url.query_pairs().into_owned().collect(),
            headers: HashMap::new(),
        })
    }

    /// Add a header. Names are case-insensitive.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Path plus query string, as received.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Forwarded host, falling back to `Host`. May carry a port.
    pub fn host(&self) -> &str {
        self.header("x-forwarded-host")
            .or_else(|| self.header("host"))
            .unwrap_or_default()
    }

    /// Bearer token, preferring the header forwarded by a proxy.
    pub fn authorization(&self) -> Option<&str> {
        self.header("x-forwarded-authorization")
            .or_else(|| self.header("authorization"))
            .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
            .filter(|token| !token.is_empty())
    }
}
