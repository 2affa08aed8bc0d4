//! Tenant and principal lookup.

use std::sync::Arc;
use std::time::Duration;

use docgraph_repository::{DocumentGraphService, FilterOp, Query, RequestContext};
use docgraph_shared::types::document::CREATED_AT_FIELD;
use docgraph_shared::{Fields, ResolvePolicy, Snapshot, Value};
use tracing::{debug, instrument, warn};

use super::context::{Instance, Principal, TenantContext};
use super::verifier::TokenVerifier;
use crate::cache::TtlCache;
use crate::errors::ApiError;
use crate::request::ApiRequest;

/// Root collection holding instance documents.
pub const INSTANCES_COLLECTION: &str = "instances";

/// Member sub-collection of an instance.
pub const MEMBERS_COLLECTION: &str = "members";

/// How long a resolved instance is reused for its host.
pub const INSTANCE_TTL: Duration = Duration::from_secs(60 * 60);

const DOMAINS_FIELD: &str = "config.domains";
const USER_FIELD: &str = "user";

/// Resolves the instance and principal of incoming requests.
#[derive(Clone)]
pub struct TenantResolver {
    service: DocumentGraphService,
    verifier: Arc<dyn TokenVerifier>,
    instances: TtlCache<Instance>,
    forced_instance_id: Option<String>,
}

impl TenantResolver {
    pub fn new(service: DocumentGraphService, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            service,
            verifier,
            instances: TtlCache::new(INSTANCE_TTL),
            forced_instance_id: None,
        }
    }

    /// Always serve the instance with this id, whatever the host.
    pub fn with_forced_instance(mut self, instance_id: impl Into<String>) -> Self {
        self.forced_instance_id = Some(instance_id.into());
        self
    }

    pub fn with_instance_ttl(mut self, ttl: Duration) -> Self {
        self.instances = TtlCache::new(ttl);
        self
    }

    /// Resolve the tenant context of `request`.
    ///
    /// An instance lookup failure fails the request. A token that cannot be verified only
    /// downgrades the request to a guest.
    #[instrument(skip(self, request), fields(host = %request.host(), path = %request.path()))]
    pub async fn resolve(&self, request: &ApiRequest) -> Result<TenantContext, ApiError> {
        let host = clean_host(request.host()).to_string();
        let instance = self.instance(&host).await?;

        let principal = match request.authorization() {
            None => None,
            Some(token) => match self.principal(&instance, token).await {
                Ok(principal) => Some(principal),
                Err(e) => {
                    warn!(error = %e, "Failed to resolve principal, continuing as guest");
                    None
                }
            },
        };

        Ok(TenantContext {
            host,
            instance: Some(instance),
            principal,
        })
    }

    /// Instance served for `host` (port ignored), cached per host.
    pub async fn instance(&self, host: &str) -> Result<Instance, ApiError> {
        let host = clean_host(host);
        let result = self
            .instances
            .get_or_try_insert_with(host, || self.lookup_instance(host))
            .await;

        if result.is_err() {
            self.instances.remove(host).await;
        }

        result
    }

    async fn lookup_instance(&self, host: &str) -> Result<Instance, ApiError> {
        let ctx = RequestContext::guest();
        debug!(host = %host, forced = ?self.forced_instance_id, "Looking up instance");

        let snapshot = match &self.forced_instance_id {
            Some(id) => {
                self.service
                    .fetch(&format!("{}/{}", INSTANCES_COLLECTION, id), &ctx)
                    .await?
            }
            None => {
                let query = Query::collection(INSTANCES_COLLECTION)
                    .where_field(DOMAINS_FIELD, FilterOp::ArrayContains, host)
                    .limit(1);
                self.service
                    .find(&query, &ctx)
                    .await?
                    .into_iter()
                    .find(Snapshot::exists)
                    .ok_or_else(|| ApiError::not_found(format!("No instance found for {}", host)))?
            }
        };

        let millis = snapshot
            .data()
            .and_then(|data| data.get(CREATED_AT_FIELD))
            .and_then(to_millis);
        let document = self
            .service
            .resolve(&snapshot, &ResolvePolicy::default(), &ctx)
            .await?;

        match (document, millis) {
            (Some(document), Some(millis)) if document.id().is_some() => Ok(Instance {
                id: snapshot.path().to_string(),
                host: host.to_string(),
                millis,
                document,
            }),
            _ => Err(ApiError::malformed_instance(format!(
                "Invalid app instance for {}",
                host
            ))),
        }
    }

    /// Verify `token` and resolve the member it belongs to.
    pub async fn principal(&self, instance: &Instance, token: &str) -> Result<Principal, ApiError> {
        let uid = self.verifier.verify(token).await?;
        let id = format!("{}/{}/{}", instance.id, MEMBERS_COLLECTION, uid);
        let ctx = RequestContext::guest().with_tenant(instance.tenant_id());

        let snapshot = self.service.fetch(&id, &ctx).await?;
        let member = self
            .service
            .resolve(&snapshot, &ResolvePolicy::new(1), &ctx)
            .await?;

        let mut fields = Fields::new();
        if let Some(member) = member {
            let mut member = member.into_fields();
            if let Some(Value::Map(user)) = member.remove(USER_FIELD) {
                fields.extend(user);
            }
            fields.extend(member);
        }
        fields.insert("uid".to_string(), Value::from(uid.as_str()));
        fields.insert("id".to_string(), Value::from(id.as_str()));

        Ok(Principal { uid, id, fields })
    }
}

/// Host without its port.
fn clean_host(host: &str) -> &str {
    host.split(':').next().unwrap_or(host)
}

fn to_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Timestamp(timestamp) => Some(timestamp.to_millis()),
        Value::Date(date) => Some(date.timestamp_millis()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::StaticTokenVerifier;
    use docgraph_repository::MemoryStore;

    const SEED: &str = r#"{
        "instances/main": {
            "name": "Main shop",
            "config": {"domains": ["shop.example", "www.shop.example"]},
            "createdAt": {"_seconds": 1700000000, "_nanoseconds": 0}
        },
        "instances/broken": {
            "config": {"domains": ["broken.example"]}
        },
        "instances/main/members/u1": {
            "role": "admin",
            "userRef": {"$ref": "users/u1"}
        },
        "users/u1": {"name": "Ada", "role": "user"}
    }"#;

    fn resolver(store: Arc<MemoryStore>) -> TenantResolver {
        TenantResolver::new(
            DocumentGraphService::new(store),
            Arc::new(StaticTokenVerifier::new().with_token("good", "u1").with_token("ghost", "u9")),
        )
    }

    #[tokio::test]
    async fn test_instance_by_domain_is_cached() {
        let store = Arc::new(MemoryStore::from_json(SEED).unwrap());
        let resolver = resolver(store.clone());

        let instance = resolver.instance("shop.example:3000").await.unwrap();
        assert_eq!(instance.id, "instances/main");
        assert_eq!(instance.host, "shop.example");
        assert_eq!(instance.millis, 1_700_000_000_000);

        let executions = store.stats().executions;
        resolver.instance("shop.example").await.unwrap();
        assert_eq!(store.stats().executions, executions);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_instances() {
        let store = Arc::new(MemoryStore::from_json(SEED).unwrap());
        let resolver = resolver(store);

        let err = resolver.instance("nowhere.example").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.status_message(), "No instance found for nowhere.example");

        let err = resolver.instance("broken.example").await.unwrap_err();
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn test_forced_instance() {
        let store = Arc::new(MemoryStore::from_json(SEED).unwrap());
        let resolver = resolver(store).with_forced_instance("main");

        let instance = resolver.instance("localhost:3000").await.unwrap();
        assert_eq!(instance.id, "instances/main");
        assert_eq!(instance.domains(), vec!["shop.example", "www.shop.example"]);
    }

    #[tokio::test]
    async fn test_principal_merges_user_and_member() {
        let store = Arc::new(MemoryStore::from_json(SEED).unwrap());
        let resolver = resolver(store);

        let request = ApiRequest::get("/api/all/products")
            .unwrap()
            .with_header("X-Forwarded-Host", "shop.example")
            .with_header("Authorization", "Bearer good");
        let tenant = resolver.resolve(&request).await.unwrap();

        let principal = tenant.principal.unwrap();
        assert_eq!(principal.uid, "u1");
        assert_eq!(principal.id, "instances/main/members/u1");
        assert_eq!(principal.get("name"), Some(&Value::from("Ada")));
        // member fields win over user fields
        assert_eq!(principal.get("role"), Some(&Value::from("admin")));
        assert_eq!(principal.get("id"), Some(&Value::from("instances/main/members/u1")));
    }

    #[tokio::test]
    async fn test_unverifiable_token_degrades_to_guest() {
        let store = Arc::new(MemoryStore::from_json(SEED).unwrap());
        let resolver = resolver(store);

        let request = ApiRequest::get("/api/all/products")
            .unwrap()
            .with_header("Host", "shop.example")
            .with_header("Authorization", "Bearer forged");
        let tenant = resolver.resolve(&request).await.unwrap();

        assert!(tenant.instance.is_some());
        assert!(tenant.principal.is_none());

        // A verified user without a member document keeps only its identity.
        let ghost = resolver
            .principal(tenant.instance.as_ref().unwrap(), "ghost")
            .await
            .unwrap();
        assert_eq!(ghost.fields.len(), 2);
    }
}
