//! Conditional response caching.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use super::ttl_cache::TtlCache;
use crate::errors::ApiError;
use crate::handler::ApiResponse;

/// Expiry of cached responses.
pub const RESPONSE_TTL: Duration = Duration::from_secs(30);

/// Caches responses by request target, optionally partitioned by instance host.
///
/// Privileged (sudo) callers and debug deployments always get a fresh response.
#[derive(Clone)]
pub struct ResponseCache {
    cache: TtlCache<ApiResponse>,
    debug: bool,
}

impl ResponseCache {
    pub fn new(ttl: Duration, debug: bool) -> Self {
        Self {
            cache: TtlCache::new(ttl),
            debug,
        }
    }

    /// Cache key of a request: `"<host>:<target>"` when partitioned by a known host.
    pub fn key(host: Option<&str>, target: &str) -> String {
        match host.filter(|host| !host.is_empty()) {
            Some(host) => format!("{}:{}", host, target),
            None => target.to_string(),
        }
    }

    pub fn bypasses(&self, sudo: bool) -> bool {
        sudo || self.debug
    }

    /// Serve `key` from the cache or compute it. Errors are never cached.
    pub async fn respond<F, Fut>(
        &self,
        key: &str,
        sudo: bool,
        compute: F,
    ) -> Result<ApiResponse, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ApiResponse, ApiError>>,
    {
        if self.bypasses(sudo) {
            debug!(key = %key, sudo, "Bypassing response cache");
            return compute().await;
        }

        self.cache.get_or_try_insert_with(key, compute).await
    }
}
