//! Reference graph resolver.
//!
//! Expands a snapshot into a plain document tree by fetching referenced documents up to the
//! depth allowed by a `ResolvePolicy`. The input snapshot is never mutated; every call builds
//! a new tree owned by the request.

use std::sync::Arc;

use docgraph_shared::types::document::{is_audit_field, AUDIT_FIELDS};
use docgraph_shared::{
    Document, DocumentRef, FieldKind, Fields, ResolvePolicy, SchemaRegistry, Snapshot, Value,
};
use futures::future::{join_all, try_join_all, BoxFuture};
use futures::FutureExt;
use tracing::{debug, instrument, warn};

use crate::config::DocGraphConfig;
use crate::context::RequestContext;
use crate::errors::DocGraphError;
use crate::interfaces::DocumentStore;
use crate::normalizer::{normalize, normalize_embedded};

/// Audit principals are resolved at least this deep so their own profile is visible.
const AUDIT_MIN_LEVEL: u32 = 2;

/// Resolves reference fields of snapshots against a `DocumentStore`.
///
/// Sibling reference fields are fetched concurrently. A failed single reference fails the
/// whole resolution; a failed element of a reference list only drops that element.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use docgraph_repository::{DocumentStore, MemoryStore, ReferenceResolver, RequestContext};
/// use docgraph_shared::{DocumentRef, ResolvePolicy, Value};
///
/// # async fn example() -> Result<(), docgraph_repository::DocGraphError> {
/// let store = Arc::new(MemoryStore::from_json(r#"{
///     "products/p1": {"name": "Chair", "ownerRef": {"$ref": "users/u1"}},
///     "users/u1": {"name": "Ada"}
/// }"#)?);
/// let resolver = ReferenceResolver::new(store.clone());
///
/// let snapshot = store.fetch(&DocumentRef::new("products/p1")).await?;
/// let product = resolver
///     .resolve(&snapshot, &ResolvePolicy::new(1), &RequestContext::guest())
///     .await?
///     .expect("product exists");
///
/// assert!(product.get("ownerRef").is_none());
/// assert_eq!(product.get("owner").and_then(Value::as_map).map(|o| o["name"].clone()),
///     Some(Value::from("Ada")));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ReferenceResolver {
    store: Arc<dyn DocumentStore>,
    schemas: Arc<SchemaRegistry>,
    config: DocGraphConfig,
}

impl ReferenceResolver {
    /// Create a resolver classifying fields by naming convention only.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            schemas: Arc::new(SchemaRegistry::new()),
            config: DocGraphConfig::default(),
        }
    }

    /// Use explicit field declarations for the registered collections.
    pub fn with_schemas(mut self, schemas: SchemaRegistry) -> Self {
        self.schemas = Arc::new(schemas);
        self
    }

    pub fn with_config(mut self, config: DocGraphConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn config(&self) -> &DocGraphConfig {
        &self.config
    }

    /// Resolve a snapshot into a document.
    ///
    /// # Arguments
    ///
    /// * `snapshot` - The stored record to expand
    /// * `policy` - Depth and omitted field paths
    /// * `ctx` - Request context; its authorization flag gates audit fields
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Document))` - The resolved document
    /// * `Ok(None)` - The snapshot reports a missing document
    /// * `Err(DocGraphError)` - A single reference fetch failed or timed out
    #[instrument(skip(self, snapshot, policy, ctx), fields(path = %snapshot.path(), level = policy.level))]
    pub async fn resolve(
        &self,
        snapshot: &Snapshot,
        policy: &ResolvePolicy,
        ctx: &RequestContext,
    ) -> Result<Option<Document>, DocGraphError> {
        self.resolve_boxed(snapshot.clone(), policy.clone(), ctx)
            .await
    }

    /// Fetch a document under the request deadline.
    pub async fn fetch(
        &self,
        reference: &DocumentRef,
        ctx: &RequestContext,
    ) -> Result<Snapshot, DocGraphError> {
        ctx.bounded(
            self.config.fetch_timeout,
            "fetch",
            self.store.fetch(reference),
        )
        .await
    }

    fn resolve_boxed<'a>(
        &'a self,
        snapshot: Snapshot,
        policy: ResolvePolicy,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Option<Document>, DocGraphError>> {
        async move {
            if !snapshot.exists() {
                return Ok(None);
            }

            let path = snapshot.path().to_string();
            let raw = snapshot.into_data().unwrap_or_default();

            let mut output = Fields::new();
            let mut singles: Vec<BoxFuture<'a, Result<(String, Option<Document>), DocGraphError>>> =
                Vec::new();
            let mut lists: Vec<BoxFuture<'a, (String, Vec<Document>)>> = Vec::new();

            for (field, value) in raw {
                let descriptor = self.schemas.describe(&path, &field, &value);
                let key = descriptor.output_key;

                match descriptor.kind {
                    FieldKind::SingleReference => {
                        if policy.omits(&key) {
                            debug!(field = %field, "Omitted reference");
                            continue;
                        }
                        let Some(reference) = value.as_reference().cloned() else {
                            continue;
                        };
                        if policy.level == 0 {
                            continue;
                        }

                        let mut level = policy.level;
                        if is_audit_field(&key) {
                            if !ctx.with_auth {
                                debug!(field = %field, "Redacted audit reference");
                                continue;
                            }
                            level = level.max(AUDIT_MIN_LEVEL);
                        }

                        let child_policy = policy.descend(&key, level);
                        singles.push(
                            async move {
                                let child = self.fetch(&reference, ctx).await?;
                                let document = self.resolve_boxed(child, child_policy, ctx).await?;
                                Ok((key, document))
                            }
                            .boxed(),
                        );
                    }
                    FieldKind::ReferenceList => {
                        if policy.level == 0 || policy.omits(&key) {
                            continue;
                        }
                        let Value::Array(items) = value else {
                            continue;
                        };

                        let child_policy = policy.descend(&key, policy.level);
                        lists.push(
                            async move {
                                let documents = self.resolve_list(items, child_policy, ctx).await;
                                (key, documents)
                            }
                            .boxed(),
                        );
                    }
                    FieldKind::Embedded => {
                        if self.redacts(&field, &policy, ctx) {
                            continue;
                        }
                        output.insert(field, normalize_embedded(value));
                    }
                    FieldKind::Scalar | FieldKind::Timestamp => {
                        if self.redacts(&field, &policy, ctx) {
                            continue;
                        }
                        output.insert(field, value);
                    }
                }
            }

            let (singles, lists) = futures::join!(try_join_all(singles), join_all(lists));

            for (key, document) in singles? {
                if let Some(document) = document {
                    output.insert(key, Value::from(document));
                }
            }
            for (key, documents) in lists {
                output.insert(
                    key,
                    Value::Array(documents.into_iter().map(Value::from).collect()),
                );
            }

            Ok(Some(normalize(&path, Some(output))))
        }
        .boxed()
    }

    /// Resolve every reference of a list concurrently, keeping successes in their original order.
    async fn resolve_list(
        &self,
        items: Vec<Value>,
        policy: ResolvePolicy,
        ctx: &RequestContext,
    ) -> Vec<Document> {
        let tasks = items
            .into_iter()
            .filter_map(|item| item.as_reference().cloned())
            .map(|reference| {
                let policy = policy.clone();
                async move {
                    let result = match self.fetch(&reference, ctx).await {
                        Ok(child) if child.data().is_none() => Ok(None),
                        Ok(child) => self.resolve_boxed(child, policy, ctx).await,
                        Err(e) => Err(e),
                    };
                    (reference, result)
                }
            });

        join_all(tasks)
            .await
            .into_iter()
            .filter_map(|(reference, result)| match result {
                Ok(Some(document)) => Some(document),
                Ok(None) => {
                    debug!(path = %reference, "Dropped missing list reference");
                    None
                }
                Err(e) => {
                    warn!(path = %reference, error = %e, "Dropped failed list reference");
                    None
                }
            })
            .collect()
    }

    /// Audit principals stored inline are only exposed to authorized callers resolving at depth.
    fn redacts(&self, field: &str, policy: &ResolvePolicy, ctx: &RequestContext) -> bool {
        AUDIT_FIELDS.contains(&field) && (!ctx.with_auth || policy.level == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use async_trait::async_trait;
    use docgraph_shared::DocumentSchema;
    use std::collections::HashMap;

    /// Store failing every fetch of the listed paths.
    struct FlakyStore {
        documents: HashMap<String, Fields>,
        failing: Vec<String>,
    }

    impl FlakyStore {
        fn new(seed: &str, failing: &[&str]) -> Self {
            let documents: HashMap<String, Fields> = serde_json::from_str(seed).unwrap();
            Self {
                documents,
                failing: failing.iter().map(|p| p.to_string()).collect(),
            }
        }
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn fetch(&self, reference: &DocumentRef) -> Result<Snapshot, DocGraphError> {
            if self.failing.iter().any(|p| p == reference.path()) {
                return Err(DocGraphError::fetch(format!("boom: {}", reference)));
            }
            Ok(match self.documents.get(reference.path()) {
                Some(fields) => Snapshot::found(reference.path(), fields.clone()),
                None => Snapshot::missing(reference.path()),
            })
        }

        async fn count(&self, _query: &Query) -> Result<u64, DocGraphError> {
            Ok(0)
        }

        async fn execute(&self, _query: &Query) -> Result<Vec<Snapshot>, DocGraphError> {
            Ok(vec![])
        }
    }

    async fn resolve(
        store: FlakyStore,
        path: &str,
        policy: ResolvePolicy,
        ctx: RequestContext,
    ) -> Result<Option<Document>, DocGraphError> {
        let store = Arc::new(store);
        let snapshot = store.fetch(&DocumentRef::new(path)).await?;
        ReferenceResolver::new(store).resolve(&snapshot, &policy, &ctx).await
    }

    #[tokio::test]
    async fn test_missing_snapshot_resolves_to_none() {
        let store = FlakyStore::new("{}", &[]);
        let result = resolve(store, "a/b", ResolvePolicy::new(3), RequestContext::guest()).await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_probe_existence_is_honoured() {
        let store = Arc::new(FlakyStore::new("{}", &[]));
        let resolver = ReferenceResolver::new(store);
        let mut data = Fields::new();
        data.insert("name".into(), Value::from("ghost"));

        let hidden = Snapshot::with_probe("a/b", Some(data.clone()), || false);
        let shown = Snapshot::with_probe("a/b", Some(data), || true);
        let ctx = RequestContext::guest();

        assert!(resolver
            .resolve(&hidden, &ResolvePolicy::new(1), &ctx)
            .await
            .unwrap()
            .is_none());
        assert!(resolver
            .resolve(&shown, &ResolvePolicy::new(1), &ctx)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_single_reference_failure_propagates() {
        let store = FlakyStore::new(
            r#"{"orders/o1": {"buyerRef": {"$ref": "users/u1"}}}"#,
            &["users/u1"],
        );
        let result = resolve(store, "orders/o1", ResolvePolicy::new(1), RequestContext::guest()).await;
        assert!(matches!(result, Err(DocGraphError::FetchError(_))));
    }

    #[tokio::test]
    async fn test_dangling_single_reference_is_dropped() {
        let store = FlakyStore::new(r#"{"orders/o1": {"buyerRef": {"$ref": "users/gone"}}}"#, &[]);
        let order = resolve(store, "orders/o1", ResolvePolicy::new(1), RequestContext::guest())
            .await
            .unwrap()
            .unwrap();
        assert!(order.get("buyer").is_none());
        assert!(order.get("buyerRef").is_none());
    }

    #[tokio::test]
    async fn test_array_shaped_embedded_field_resolves_to_list() {
        let store = FlakyStore::new(
            r#"{"orders/o1": {"lines": {"0": {"id": "x", "qty": 1}, "1": {"id": "y", "qty": 2}}}}"#,
            &[],
        );
        let order = resolve(store, "orders/o1", ResolvePolicy::new(1), RequestContext::guest())
            .await
            .unwrap()
            .unwrap();

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["lines"], serde_json::json!([{"qty": 1}, {"qty": 2}]));
    }

    #[tokio::test]
    async fn test_null_reference_is_stripped_without_fetch() {
        let store = FlakyStore::new(r#"{"orders/o1": {"buyerRef": null}}"#, &["users/u1"]);
        let order = resolve(store, "orders/o1", ResolvePolicy::new(2), RequestContext::guest())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.keys().collect::<Vec<_>>(), vec!["id"]);
    }

    #[tokio::test]
    async fn test_audit_reference_resolves_two_levels_when_authorized() {
        let seed = r#"{
            "products/p1": {"createdByRef": {"$ref": "members/m1"}},
            "members/m1": {"role": "admin", "userRef": {"$ref": "users/u1"}},
            "users/u1": {"name": "Ada"}
        }"#;

        let product = resolve(
            FlakyStore::new(seed, &[]),
            "products/p1",
            ResolvePolicy::new(1),
            RequestContext::authorized(),
        )
        .await
        .unwrap()
        .unwrap();
        let member = product.get("createdBy").and_then(Value::as_map).unwrap();
        assert_eq!(member["role"], Value::from("admin"));
        assert_eq!(member["user"].as_map().unwrap()["name"], Value::from("Ada"));

        let redacted = resolve(
            FlakyStore::new(seed, &[]),
            "products/p1",
            ResolvePolicy::new(1),
            RequestContext::guest(),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(redacted.get("createdBy").is_none());
        assert!(redacted.get("createdByRef").is_none());
    }

    #[tokio::test]
    async fn test_inline_audit_fields_require_authorized_depth() {
        let seed = r#"{"products/p1": {"updatedBy": {"name": "Ada"}, "name": "Chair"}}"#;

        let guest = resolve(
            FlakyStore::new(seed, &[]),
            "products/p1",
            ResolvePolicy::new(1),
            RequestContext::guest(),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(guest.get("updatedBy").is_none());

        let shallow = resolve(
            FlakyStore::new(seed, &[]),
            "products/p1",
            ResolvePolicy::new(0),
            RequestContext::authorized(),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(shallow.get("updatedBy").is_none());

        let deep = resolve(
            FlakyStore::new(seed, &[]),
            "products/p1",
            ResolvePolicy::new(1),
            RequestContext::authorized(),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(deep.get("updatedBy").is_some());
    }

    #[tokio::test]
    async fn test_schema_declared_reference() {
        let store = Arc::new(FlakyStore::new(
            r#"{
                "orders/o1": {"buyer": {"$ref": "users/u1"}},
                "users/u1": {"name": "Ada"}
            }"#,
            &[],
        ));
        let resolver = ReferenceResolver::new(store.clone()).with_schemas(
            SchemaRegistry::new().register("orders", DocumentSchema::new().reference("buyer", "customer")),
        );

        let snapshot = store.fetch(&DocumentRef::new("orders/o1")).await.unwrap();
        let order = resolver
            .resolve(&snapshot, &ResolvePolicy::new(1), &RequestContext::guest())
            .await
            .unwrap()
            .unwrap();

        assert!(order.get("buyer").is_none());
        assert_eq!(
            order.get("customer").and_then(Value::as_map).unwrap()["name"],
            Value::from("Ada")
        );
    }

    #[tokio::test]
    async fn test_non_reference_list_entries_are_skipped() {
        let store = FlakyStore::new(
            r#"{
                "carts/c1": {"itemsRefs": [{"$ref": "items/i1"}, null, "items/i2", {"$ref": "items/gone"}]},
                "items/i1": {"name": "one"},
                "items/i2": {"name": "two"}
            }"#,
            &[],
        );
        let cart = resolve(store, "carts/c1", ResolvePolicy::new(1), RequestContext::guest())
            .await
            .unwrap()
            .unwrap();

        let items = cart.get("items").and_then(Value::as_array).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_map().unwrap()["id"], Value::from("items/i1"));
    }
}
