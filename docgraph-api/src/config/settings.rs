//! Environment configuration.

use std::env;
use std::time::Duration;

use docgraph_repository::config::DEFAULT_FETCH_TIMEOUT;
use tracing::info;

use crate::cache::RESPONSE_TTL;
use crate::tenant::INSTANCE_TTL;

/// Default seed file loaded into the in-memory store.
const DEFAULT_SEED_FILE: &str = "seed.json";

/// Default host used when a request carries no host header.
const DEFAULT_HOST: &str = "localhost";

/// Settings of the API binary.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// JSON file of `{ "<path>": { fields } }` documents.
    pub seed_file: String,
    /// Serve every request from this instance instead of looking it up by host.
    pub forced_instance_id: Option<String>,
    pub fetch_timeout: Duration,
    /// Overall budget of one request, unbounded when unset.
    pub request_timeout: Option<Duration>,
    pub cache_ttl: Duration,
    pub instance_ttl: Duration,
    /// Disables the response cache.
    pub debug_cache: bool,
    pub host: String,
    /// `token:uid` pairs accepted as bearer tokens.
    pub tokens: String,
    pub sudo_roles: Vec<String>,
    /// Readable root collections. Everything is readable when both lists are empty.
    pub readable_collections: Vec<String>,
    pub readable_instance_collections: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            seed_file: DEFAULT_SEED_FILE.to_string(),
            forced_instance_id: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            request_timeout: None,
            cache_ttl: RESPONSE_TTL,
            instance_ttl: INSTANCE_TTL,
            debug_cache: false,
            host: DEFAULT_HOST.to_string(),
            tokens: String::new(),
            sudo_roles: Vec::new(),
            readable_collections: Vec::new(),
            readable_instance_collections: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Read the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DOCGRAPH_SEED_FILE`: Seed documents (default: seed.json)
    /// - `DOCGRAPH_FORCED_INSTANCE_ID`: Instance served regardless of host
    /// - `DOCGRAPH_FETCH_TIMEOUT_SECS`: Per call store timeout (default: 30)
    /// - `DOCGRAPH_REQUEST_TIMEOUT_SECS`: Overall request deadline
    /// - `DOCGRAPH_CACHE_TTL_SECS`: Response cache expiry (default: 30)
    /// - `DOCGRAPH_DEBUG_CACHE`: "true" disables the response cache
    /// - `DOCGRAPH_HOST`: Host assumed when a request has none (default: localhost)
    /// - `DOCGRAPH_TOKENS`: Accepted bearer tokens as `token:uid,token:uid`
    /// - `DOCGRAPH_SUDO_ROLES`: Comma separated member roles treated as privileged
    /// - `DOCGRAPH_READABLE_COLLECTIONS`: Comma separated readable root collections
    /// - `DOCGRAPH_READABLE_INSTANCE_COLLECTIONS`: Comma separated readable instance collections
    pub fn from_env() -> Self {
        let config = Self::from_lookup(|key| env::var(key).ok());

        info!(
            seed_file = %config.seed_file,
            forced_instance_id = ?config.forced_instance_id,
            fetch_timeout_secs = config.fetch_timeout.as_secs(),
            cache_ttl_secs = config.cache_ttl.as_secs(),
            debug_cache = config.debug_cache,
            host = %config.host,
            "Loaded configuration"
        );

        config
    }

    /// Build the configuration from any key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secs = |key: &str| {
            lookup(key)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
        };

        Self {
            seed_file: lookup("DOCGRAPH_SEED_FILE")
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.seed_file),
            forced_instance_id: lookup("DOCGRAPH_FORCED_INSTANCE_ID")
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            fetch_timeout: secs("DOCGRAPH_FETCH_TIMEOUT_SECS").unwrap_or(defaults.fetch_timeout),
            request_timeout: secs("DOCGRAPH_REQUEST_TIMEOUT_SECS"),
            cache_ttl: secs("DOCGRAPH_CACHE_TTL_SECS").unwrap_or(defaults.cache_ttl),
            instance_ttl: defaults.instance_ttl,
            debug_cache: lookup("DOCGRAPH_DEBUG_CACHE")
                .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1"))
                .unwrap_or(false),
            host: lookup("DOCGRAPH_HOST")
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.host),
            tokens: lookup("DOCGRAPH_TOKENS").unwrap_or_default(),
            sudo_roles: list(lookup("DOCGRAPH_SUDO_ROLES")),
            readable_collections: list(lookup("DOCGRAPH_READABLE_COLLECTIONS")),
            readable_instance_collections: list(lookup("DOCGRAPH_READABLE_INSTANCE_COLLECTIONS")),
        }
    }

    /// Returns true if collection reads are restricted to the configured lists.
    pub fn restricts_access(&self) -> bool {
        !self.readable_collections.is_empty() || !self.readable_instance_collections.is_empty()
    }
}

fn list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
