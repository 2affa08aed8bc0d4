//! Dependency initialization and wiring for the document graph API.

use std::io::ErrorKind;
use std::sync::Arc;

use docgraph_repository::{DocGraphConfig, DocumentGraphService, MemoryStore};
use tracing::{info, warn};

use super::settings::ApiConfig;
use crate::access::{AllowAll, AllowList, CollectionAccess};
use crate::cache::ResponseCache;
use crate::handler::DocGraphApi;
use crate::tenant::{DenySudo, RoleSudo, StaticTokenVerifier, SudoPolicy, TenantResolver};
use crate::ServerError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured API ready to handle requests.
    pub api: DocGraphApi,
    /// Backing store, kept for inspection.
    pub store: Arc<MemoryStore>,
    /// Host assumed for requests that carry none.
    pub host: String,
}

impl Dependencies {
    /// Load the seed file and wire the API.
    ///
    /// A missing seed file starts an empty store; an unreadable or malformed one is fatal.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(ServerError)` - If the seed cannot be loaded
    pub async fn new(config: &ApiConfig) -> Result<Self, ServerError> {
        let store = match tokio::fs::read_to_string(&config.seed_file).await {
            Ok(seed) => MemoryStore::from_json(&seed).map_err(|e| {
                ServerError::config(format!("Failed to parse {}: {}", config.seed_file, e))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(seed_file = %config.seed_file, "Seed file not found, starting empty");
                MemoryStore::new()
            }
            Err(e) => {
                return Err(ServerError::config(format!(
                    "Failed to read {}: {}",
                    config.seed_file, e
                )))
            }
        };

        info!(documents = store.len(), "Document store loaded");

        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Wire the API around an already populated store.
    pub fn with_store(config: &ApiConfig, store: Arc<MemoryStore>) -> Self {
        let service = DocumentGraphService::with_config(
            store.clone(),
            DocGraphConfig::default().with_fetch_timeout(config.fetch_timeout),
        );

        let verifier = StaticTokenVerifier::parse(&config.tokens);
        info!(tokens = verifier.len(), "Token verifier ready");

        let mut tenants = TenantResolver::new(service.clone(), Arc::new(verifier))
            .with_instance_ttl(config.instance_ttl);
        if let Some(instance_id) = &config.forced_instance_id {
            tenants = tenants.with_forced_instance(instance_id.clone());
        }

        let access: Arc<dyn CollectionAccess> = if config.restricts_access() {
            Arc::new(
                AllowList::new()
                    .root(config.readable_collections.iter().cloned())
                    .instance(config.readable_instance_collections.iter().cloned()),
            )
        } else {
            Arc::new(AllowAll)
        };

        let sudo: Arc<dyn SudoPolicy> = if config.sudo_roles.is_empty() {
            Arc::new(DenySudo)
        } else {
            Arc::new(RoleSudo::new(config.sudo_roles.iter().cloned()))
        };

        let mut api = DocGraphApi::new(service, tenants)
            .with_access(access)
            .with_sudo(sudo)
            .with_cache(ResponseCache::new(config.cache_ttl, config.debug_cache));
        if let Some(timeout) = config.request_timeout {
            api = api.with_request_timeout(timeout);
        }

        Self {
            api,
            store,
            host: config.host.clone(),
        }
    }
}
