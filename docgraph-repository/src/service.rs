//! Document graph service implementation.
//!
//! This module provides the main service for reading the document graph. Request handlers
//! use it to fetch single documents, list collections and page through them; every result
//! is resolved through the same `ReferenceResolver`.

use std::sync::Arc;

use docgraph_shared::{
    Document, DocumentRef, Edge, ListRequest, OrderBy, Page, PageRequest, ResolvePolicy,
    SchemaRegistry, Snapshot,
};
use tracing::{debug, instrument};

use crate::config::DocGraphConfig;
use crate::context::RequestContext;
use crate::errors::DocGraphError;
use crate::interfaces::DocumentStore;
use crate::paginator::CursorPaginator;
use crate::query::Query;
use crate::resolver::ReferenceResolver;
use crate::utils::{clean_include, validate_segment};

/// Where a collection lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionScope {
    /// Directly below the store root.
    Root,
    /// Below the document of the request's tenant.
    Instance,
}

/// The main service for reading the document graph.
///
/// This is the high-level API request handlers should use. It validates input, builds the
/// ordered queries and delegates to the resolver and paginator. All operations return
/// `DocGraphError` for consistent error handling.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use docgraph_repository::{DocumentGraphService, MemoryStore, RequestContext};
/// use docgraph_shared::{ListRequest, ResolvePolicy};
///
/// # async fn example() -> Result<(), docgraph_repository::DocGraphError> {
/// let store = Arc::new(MemoryStore::from_json(r#"{
///     "products/p1": {"name": "Chair", "createdAt": {"_seconds": 10, "_nanoseconds": 0}}
/// }"#)?);
/// let service = DocumentGraphService::new(store);
/// let ctx = RequestContext::guest();
///
/// let chair = service
///     .get_document("products", "p1", &ResolvePolicy::default(), &ctx)
///     .await?;
/// assert_eq!(chair.id(), Some("products/p1"));
///
/// let edges = service.list("products", &ListRequest::default(), &ctx).await?;
/// assert_eq!(edges.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DocumentGraphService {
    resolver: ReferenceResolver,
    paginator: CursorPaginator,
    config: DocGraphConfig,
}

impl DocumentGraphService {
    /// Create a new DocumentGraphService with default configuration.
    ///
    /// # Arguments
    ///
    /// * `store` - A shared implementation of `DocumentStore` (e.g., `MemoryStore`)
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, DocGraphConfig::default())
    }

    /// Create a new DocumentGraphService with custom configuration.
    ///
    /// # Arguments
    ///
    /// * `store` - A shared implementation of `DocumentStore`
    /// * `config` - Timeouts and page size bounds
    pub fn with_config(store: Arc<dyn DocumentStore>, config: DocGraphConfig) -> Self {
        let resolver = ReferenceResolver::new(store).with_config(config.clone());
        Self {
            paginator: CursorPaginator::new(resolver.clone()),
            resolver,
            config,
        }
    }

    /// Use explicit field declarations for the registered collections.
    pub fn with_schemas(mut self, schemas: SchemaRegistry) -> Self {
        self.resolver = self.resolver.with_schemas(schemas);
        self.paginator = CursorPaginator::new(self.resolver.clone());
        self
    }

    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    pub fn config(&self) -> &DocGraphConfig {
        &self.config
    }

    /// Path of `collection` in the given scope.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - `"<collection>"` or `"<tenant path>/<collection>"`
    /// * `Err(DocGraphError::PermissionDenied)` - Instance scope without a tenant
    pub fn collection_path(
        &self,
        scope: CollectionScope,
        collection: &str,
        ctx: &RequestContext,
    ) -> Result<String, DocGraphError> {
        validate_segment("collection", collection)?;

        match scope {
            CollectionScope::Root => Ok(collection.to_string()),
            CollectionScope::Instance => {
                let tenant = ctx
                    .tenant
                    .as_ref()
                    .ok_or_else(|| DocGraphError::permission_denied("Missing instance"))?;
                Ok(format!("{}/{}", tenant.path(), collection))
            }
        }
    }

    /// Resolve a snapshot obtained elsewhere.
    pub async fn resolve(
        &self,
        snapshot: &Snapshot,
        policy: &ResolvePolicy,
        ctx: &RequestContext,
    ) -> Result<Option<Document>, DocGraphError> {
        self.resolver.resolve(snapshot, policy, ctx).await
    }

    /// Run a raw query under the request deadline, without resolving the matches.
    pub async fn find(
        &self,
        query: &Query,
        ctx: &RequestContext,
    ) -> Result<Vec<Snapshot>, DocGraphError> {
        let store = self.resolver.store();
        ctx.bounded(self.config.fetch_timeout, "query", store.execute(query))
            .await
    }

    /// Fetch a raw snapshot under the request deadline.
    pub async fn fetch(
        &self,
        path: &str,
        ctx: &RequestContext,
    ) -> Result<Snapshot, DocGraphError> {
        self.resolver.fetch(&DocumentRef::new(path), ctx).await
    }

    /// Fetch and resolve one document.
    ///
    /// # Arguments
    ///
    /// * `collection_path` - Path of the collection (see `collection_path`)
    /// * `document_id` - Id of the document inside the collection
    /// * `policy` - Resolution depth and omitted fields
    /// * `ctx` - Request context
    ///
    /// # Returns
    ///
    /// * `Ok(Document)` - The resolved document
    /// * `Err(DocGraphError::NotFound)` - No document at that path
    /// * `Err(DocGraphError)` - Validation, fetch or timeout failure
    #[instrument(skip(self, policy, ctx), fields(level = policy.level))]
    pub async fn get_document(
        &self,
        collection_path: &str,
        document_id: &str,
        policy: &ResolvePolicy,
        ctx: &RequestContext,
    ) -> Result<Document, DocGraphError> {
        if collection_path.is_empty() {
            return Err(DocGraphError::validation("collection is required"));
        }
        validate_segment("document_id", document_id)?;

        let path = format!("{}/{}", collection_path, document_id);
        let snapshot = self.resolver.fetch(&DocumentRef::new(&path), ctx).await?;

        let not_found = || {
            DocGraphError::not_found(format!(
                "No \"{}\" document matched for {}",
                collection_name(collection_path),
                path
            ))
        };

        if !snapshot.exists() {
            return Err(not_found());
        }

        self.resolver
            .resolve(&snapshot, policy, ctx)
            .await?
            .ok_or_else(not_found)
    }

    /// List a collection as edges, without pagination metadata.
    ///
    /// With a non-empty `include`, only those documents are fetched (ordered by id, at most
    /// `max_include` of them). Otherwise the ordered collection is limited to `first`.
    #[instrument(skip(self, request, ctx), fields(first = ?request.first, include = request.include.len()))]
    pub async fn list(
        &self,
        collection_path: &str,
        request: &ListRequest,
        ctx: &RequestContext,
    ) -> Result<Vec<Edge>, DocGraphError> {
        if collection_path.is_empty() {
            return Err(DocGraphError::validation("collection is required"));
        }

        let query = if request.include.is_empty() {
            ordered(collection_path, request.order.as_ref())
                .limit(self.config.page_size(request.first))
        } else {
            let include = clean_include(&request.include);
            if include.is_empty() {
                debug!("Include list is empty after cleaning");
                return Ok(Vec::new());
            }
            if include.len() > self.config.max_include {
                return Err(DocGraphError::validation(format!(
                    "Cannot include more than {} documents, got {}",
                    self.config.max_include,
                    include.len()
                )));
            }
            Query::collection(collection_path)
                .where_document_id_in(include)
                .order_by_document_id()
        };

        self.paginator.edges(&query, &request.policy, ctx).await
    }

    /// Page through an ordered collection.
    #[instrument(skip(self, request, ctx), fields(first = ?request.first))]
    pub async fn page(
        &self,
        collection_path: &str,
        request: &PageRequest,
        ctx: &RequestContext,
    ) -> Result<Page, DocGraphError> {
        if collection_path.is_empty() {
            return Err(DocGraphError::validation("collection is required"));
        }

        let query = ordered(collection_path, request.order.as_ref());
        self.paginator.paginate(&query, request, ctx).await
    }
}

/// Collection ordered by the requested field, newest first by default.
fn ordered(collection_path: &str, order: Option<&OrderBy>) -> Query {
    let default_order = OrderBy::default();
    Query::collection(collection_path).with_order(order.unwrap_or(&default_order))
}

fn collection_name(collection_path: &str) -> &str {
    collection_path.rsplit('/').next().unwrap_or(collection_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TenantId;
    use async_trait::async_trait;
    use docgraph_shared::{Direction, Fields, Timestamp, Value};
    use std::sync::Mutex;

    /// Mock store recording every query it receives.
    struct MockStore {
        snapshots: Vec<Snapshot>,
        queries: Mutex<Vec<Query>>,
        fail: bool,
    }

    impl MockStore {
        fn new(snapshots: Vec<Snapshot>) -> Self {
            Self {
                snapshots,
                queries: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(vec![])
            }
        }
    }

    #[async_trait]
    impl DocumentStore for MockStore {
        async fn fetch(&self, reference: &DocumentRef) -> Result<Snapshot, DocGraphError> {
            if self.fail {
                return Err(DocGraphError::connection("Mock connection error"));
            }
            Ok(self
                .snapshots
                .iter()
                .find(|snapshot| snapshot.path() == reference.path())
                .cloned()
                .unwrap_or_else(|| Snapshot::missing(reference.path())))
        }

        async fn count(&self, query: &Query) -> Result<u64, DocGraphError> {
            self.queries.lock().unwrap().push(query.clone());
            Ok(self.snapshots.len() as u64)
        }

        async fn execute(&self, query: &Query) -> Result<Vec<Snapshot>, DocGraphError> {
            if self.fail {
                return Err(DocGraphError::query("Mock query error"));
            }
            self.queries.lock().unwrap().push(query.clone());
            Ok(self.snapshots.clone())
        }
    }

    fn product(id: &str) -> Snapshot {
        let mut fields = Fields::new();
        fields.insert("name".into(), Value::from(id));
        fields.insert(
            "createdAt".into(),
            Value::Timestamp(Timestamp::new(1_700_000_000, 0)),
        );
        Snapshot::found(format!("products/{}", id), fields)
    }

    #[tokio::test]
    async fn test_get_document_success() {
        let service = DocumentGraphService::new(Arc::new(MockStore::new(vec![product("p1")])));

        let document = service
            .get_document("products", "p1", &ResolvePolicy::default(), &RequestContext::guest())
            .await
            .unwrap();

        assert_eq!(document.id(), Some("products/p1"));
        assert!(matches!(document.get("createdAt"), Some(Value::Date(_))));
    }

    #[tokio::test]
    async fn test_get_document_not_found() {
        let service = DocumentGraphService::new(Arc::new(MockStore::new(vec![])));

        let err = service
            .get_document(
                "instances/main/products",
                "p9",
                &ResolvePolicy::default(),
                &RequestContext::guest(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DocGraphError::NotFound(_)));
        assert_eq!(
            err.to_string(),
            "Not found: No \"products\" document matched for instances/main/products/p9"
        );
    }

    #[tokio::test]
    async fn test_get_document_validation() {
        let service = DocumentGraphService::new(Arc::new(MockStore::new(vec![])));
        let ctx = RequestContext::guest();
        let policy = ResolvePolicy::default();

        let err = service.get_document("products", "", &policy, &ctx).await.unwrap_err();
        assert!(matches!(err, DocGraphError::ValidationError(_)));

        let err = service.get_document("", "p1", &policy, &ctx).await.unwrap_err();
        assert!(matches!(err, DocGraphError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_get_document_propagates_store_errors() {
        let service = DocumentGraphService::new(Arc::new(MockStore::failing()));

        let err = service
            .get_document("products", "p1", &ResolvePolicy::default(), &RequestContext::guest())
            .await
            .unwrap_err();
        assert!(matches!(err, DocGraphError::ConnectionError(_)));
    }

    #[tokio::test]
    async fn test_list_applies_default_order_and_limit() {
        let store = Arc::new(MockStore::new(vec![product("p1"), product("p2")]));
        let service = DocumentGraphService::new(store.clone());

        let edges = service
            .list("products", &ListRequest::default(), &RequestContext::guest())
            .await
            .unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].cursor.decode().as_deref(), Some("products/p1"));

        let queries = store.queries.lock().unwrap();
        let query = queries.last().unwrap();
        assert_eq!(query.orders()[0].direction, Direction::Desc);
        assert_eq!(query.window(), Some(crate::query::Limit::First(10)));
    }

    #[tokio::test]
    async fn test_list_include_filters_by_id() {
        let store = Arc::new(MockStore::new(vec![product("p1")]));
        let service = DocumentGraphService::new(store.clone());

        let request = ListRequest::default().with_include(["products/p1", "true", "p2"]);
        service
            .list("products", &request, &RequestContext::guest())
            .await
            .unwrap();

        let queries = store.queries.lock().unwrap();
        let filter = &queries.last().unwrap().filters()[0];
        assert_eq!(
            filter.value,
            Value::Array(vec![Value::from("p1"), Value::from("p2")])
        );
    }

    #[tokio::test]
    async fn test_list_include_limits() {
        let store = Arc::new(MockStore::new(vec![]));
        let service = DocumentGraphService::new(store.clone());
        let ctx = RequestContext::guest();

        let only_flags = ListRequest::default().with_include(["true", ""]);
        assert!(service.list("products", &only_flags, &ctx).await.unwrap().is_empty());
        assert!(store.queries.lock().unwrap().is_empty());

        let too_many = ListRequest::default().with_include((0..31).map(|i| format!("p{}", i)));
        let err = service.list("products", &too_many, &ctx).await.unwrap_err();
        assert!(matches!(err, DocGraphError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_list_propagates_query_errors() {
        let service = DocumentGraphService::new(Arc::new(MockStore::failing()));

        let err = service
            .list("products", &ListRequest::default(), &RequestContext::guest())
            .await
            .unwrap_err();
        assert!(matches!(err, DocGraphError::QueryError(_)));
    }

    #[test]
    fn test_collection_path_scopes() {
        let service = DocumentGraphService::new(Arc::new(MockStore::new(vec![])));
        let guest = RequestContext::guest();

        assert_eq!(
            service
                .collection_path(CollectionScope::Root, "products", &guest)
                .unwrap(),
            "products"
        );

        let err = service
            .collection_path(CollectionScope::Instance, "products", &guest)
            .unwrap_err();
        assert!(matches!(err, DocGraphError::PermissionDenied(ref msg) if msg == "Missing instance"));

        let tenant = guest.with_tenant(TenantId::new("instances/main"));
        assert_eq!(
            service
                .collection_path(CollectionScope::Instance, "products", &tenant)
                .unwrap(),
            "instances/main/products"
        );
    }
}
