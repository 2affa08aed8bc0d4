//! Configuration types for the document graph.

use std::time::Duration;

/// Default deadline of a single store call.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Hard ceiling on page sizes.
pub const MAX_PAGE_SIZE: usize = 100;

/// Maximum number of documents an include filter may name (store disjunction limit).
pub const MAX_INCLUDE: usize = 30;

/// Configuration shared by the resolver, the paginator and `DocumentGraphService`.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use docgraph_repository::DocGraphConfig;
///
/// let config = DocGraphConfig::default().with_fetch_timeout(Duration::from_secs(5));
/// assert_eq!(config.page_size(Some(500)), 100);
/// ```
#[derive(Debug, Clone)]
pub struct DocGraphConfig {
    /// Deadline applied to every store call, shortened by the request deadline if any.
    pub fetch_timeout: Duration,

    /// Page size used when the request carries none (or zero).
    pub default_page_size: usize,

    /// Hard ceiling on page sizes. Requests above it are clamped, never rejected.
    pub max_page_size: usize,

    /// Maximum number of ids in an include filter.
    pub max_include: usize,
}

impl Default for DocGraphConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            max_include: MAX_INCLUDE,
        }
    }
}

impl DocGraphConfig {
    /// Create a config with a custom store call deadline.
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Create a config with a custom page size ceiling.
    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size.max(1);
        self
    }

    /// Clamp a requested page size to `[1, max_page_size]`.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        let requested = requested
            .filter(|first| *first > 0)
            .unwrap_or(self.default_page_size);

        requested.clamp(1, self.max_page_size.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_clamps() {
        let config = DocGraphConfig::default();
        assert_eq!(config.page_size(None), 10);
        assert_eq!(config.page_size(Some(0)), 10);
        assert_eq!(config.page_size(Some(1)), 1);
        assert_eq!(config.page_size(Some(100)), 100);
        assert_eq!(config.page_size(Some(1000)), 100);
    }

    #[test]
    fn test_builders() {
        let config = DocGraphConfig::default()
            .with_fetch_timeout(Duration::from_millis(250))
            .with_max_page_size(0);
        assert_eq!(config.fetch_timeout, Duration::from_millis(250));
        assert_eq!(config.page_size(Some(7)), 1);
    }
}
