//! Request dispatch.
//!
//! `DocGraphApi` runs one request through tenant resolution, access guards and the response
//! cache, then lists, pages or fetches through the `DocumentGraphService`.

use std::sync::Arc;
use std::time::Duration;

use docgraph_repository::{CollectionScope, DocumentGraphService, RequestContext};
use docgraph_shared::{Document, Edge, Page};
use serde::Serialize;
use tracing::{debug, error, instrument, warn};

use crate::access::{AllowAll, CollectionAccess};
use crate::cache::{ResponseCache, RESPONSE_TTL};
use crate::errors::ApiError;
use crate::request::{ApiRequest, CollectionParams, Method, Route};
use crate::tenant::{DenySudo, SudoPolicy, TenantContext, TenantResolver};

/// Successful outcome of a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResponse {
    /// Plain list of edges.
    Edges(Vec<Edge>),
    /// Cursor page.
    Page(Page),
    /// Single resolved document.
    Document(Document),
    /// Bodiless acknowledgement of a HEAD request.
    Ok,
    /// Answer to a preflight OPTIONS request.
    NoContent,
}

/// Status and JSON body handed back to the hosting layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub body: serde_json::Value,
}

/// The document graph request boundary.
#[derive(Clone)]
pub struct DocGraphApi {
    service: DocumentGraphService,
    tenants: TenantResolver,
    access: Arc<dyn CollectionAccess>,
    sudo: Arc<dyn SudoPolicy>,
    cache: ResponseCache,
    request_timeout: Option<Duration>,
}

impl DocGraphApi {
    /// Create an API reading every collection, without privileged callers.
    pub fn new(service: DocumentGraphService, tenants: TenantResolver) -> Self {
        Self {
            service,
            tenants,
            access: Arc::new(AllowAll),
            sudo: Arc::new(DenySudo),
            cache: ResponseCache::new(RESPONSE_TTL, false),
            request_timeout: None,
        }
    }

    pub fn with_access(mut self, access: Arc<dyn CollectionAccess>) -> Self {
        self.access = access;
        self
    }

    pub fn with_sudo(mut self, sudo: Arc<dyn SudoPolicy>) -> Self {
        self.sudo = sudo;
        self
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = cache;
        self
    }

    /// Bound every request by a deadline shared by all of its store calls.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Handle one request.
    ///
    /// # Returns
    ///
    /// * `Ok(ApiResponse)` - Edges, a page, a document, or an acknowledgement
    /// * `Err(ApiError)` - Carries the status code to answer with
    #[instrument(skip(self, request), fields(method = ?request.method(), target = %request.target()))]
    pub async fn handle(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        match request.method() {
            Method::Get | Method::Head => {}
            Method::Options => return Ok(ApiResponse::NoContent),
            Method::Other => {
                return Err(ApiError::MethodNotAllowed("Unsupported method".to_string()))
            }
        }

        let route = Route::parse(request.path())?;
        let tenant = self.tenants.resolve(request).await?;
        let sudo = self.sudo.is_sudo(&tenant);

        self.authorize(&route, &tenant)?;

        let mut ctx = tenant.request_context(sudo);
        if let Some(timeout) = self.request_timeout {
            ctx = ctx.with_deadline(timeout);
        }

        if request.method() == Method::Head {
            return self.acknowledge(&route, &ctx).await;
        }

        let partition = match route.scope() {
            CollectionScope::Root => None,
            CollectionScope::Instance => Some(tenant.host.as_str()),
        };
        let key = ResponseCache::key(partition, request.target());

        self.cache
            .respond(&key, sudo, || self.dispatch(&route, request, &ctx))
            .await
    }

    /// Handle one request and render the outcome, logging failures.
    pub async fn respond(&self, request: &ApiRequest) -> ApiReply {
        match self.handle(request).await.and_then(render) {
            Ok(reply) => reply,
            Err(e) => {
                let status = e.status_code();
                if status >= 500 {
                    error!(target_path = %request.target(), status, error = %e, "Request failed");
                } else {
                    warn!(target_path = %request.target(), status, error = %e, "Request rejected");
                }
                ApiReply {
                    status,
                    body: serde_json::json!({
                        "statusCode": status,
                        "statusMessage": e.status_message(),
                    }),
                }
            }
        }
    }

    fn authorize(&self, route: &Route, tenant: &TenantContext) -> Result<(), ApiError> {
        let collection = route.collection();
        let listing = matches!(route, Route::Collection { .. });

        match route.scope() {
            CollectionScope::Instance => {
                if tenant.instance.is_none() {
                    return Err(ApiError::unauthorized("Missing instance"));
                }
                if !self.access.can_read_instance(collection, tenant) {
                    return Err(ApiError::unauthorized(if listing {
                        format!("Can't list \"instance/{}\"", collection)
                    } else {
                        format!("Can't get \"instance/{}\" document", collection)
                    }));
                }
            }
            CollectionScope::Root => {
                if !self.access.can_read(collection, tenant) {
                    return Err(ApiError::unauthorized(if listing {
                        format!("Can't list \"{}\"", collection)
                    } else {
                        format!("Can't get \"{}\" document", collection)
                    }));
                }
            }
        }

        Ok(())
    }

    /// HEAD: collections only need the guards, documents must also exist.
    async fn acknowledge(
        &self,
        route: &Route,
        ctx: &RequestContext,
    ) -> Result<ApiResponse, ApiError> {
        if let Route::Document {
            scope,
            collection,
            document,
        } = route
        {
            let collection_path = self.service.collection_path(*scope, collection, ctx)?;
            let path = format!("{}/{}", collection_path, document);
            if !self.service.fetch(&path, ctx).await?.exists() {
                return Err(ApiError::not_found(format!(
                    "No \"{}\" document matched for {}",
                    collection, path
                )));
            }
        }

        Ok(ApiResponse::Ok)
    }

    async fn dispatch(
        &self,
        route: &Route,
        request: &ApiRequest,
        ctx: &RequestContext,
    ) -> Result<ApiResponse, ApiError> {
        let params = CollectionParams::from_pairs(request.query().iter().cloned());
        let collection_path = self
            .service
            .collection_path(route.scope(), route.collection(), ctx)?;

        match route {
            Route::Document { document, .. } => {
                let document = self
                    .service
                    .get_document(&collection_path, document, &params.policy, ctx)
                    .await?;
                Ok(ApiResponse::Document(document))
            }
            Route::Collection { .. } if !params.include.is_empty() => {
                debug!(include = params.include.len(), "Listing included documents");
                let edges = self
                    .service
                    .list(&collection_path, &params.list_request(), ctx)
                    .await?;
                Ok(ApiResponse::Edges(edges))
            }
            Route::Collection { .. } if params.page => {
                let page = self
                    .service
                    .page(&collection_path, &params.page_request(request.target()), ctx)
                    .await?;
                Ok(ApiResponse::Page(page))
            }
            Route::Collection { .. } => {
                let edges = self
                    .service
                    .list(&collection_path, &params.list_request(), ctx)
                    .await?;
                Ok(ApiResponse::Edges(edges))
            }
        }
    }
}

fn render(response: ApiResponse) -> Result<ApiReply, ApiError> {
    let (status, body) = match response {
        ApiResponse::Ok => (200, serde_json::Value::from("Ok")),
        ApiResponse::NoContent => (204, serde_json::Value::Null),
        other => (
            200,
            serde_json::to_value(&other)
                .map_err(|e| ApiError::from(docgraph_repository::DocGraphError::from(e)))?,
        ),
    };

    Ok(ApiReply { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_acknowledgements() {
        let ok = render(ApiResponse::Ok).unwrap();
        assert_eq!(ok.status, 200);
        assert_eq!(ok.body, serde_json::json!("Ok"));

        let preflight = render(ApiResponse::NoContent).unwrap();
        assert_eq!(preflight.status, 204);
        assert!(preflight.body.is_null());
    }

    #[test]
    fn test_render_document_as_plain_object() {
        let mut document = Document::new();
        document.insert("id", "p1");
        document.insert("name", "Chair");

        let reply = render(ApiResponse::Document(document)).unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["id"], "p1");
        assert_eq!(reply.body["name"], "Chair");
    }

    #[test]
    fn test_render_edges_as_array() {
        let reply = render(ApiResponse::Edges(Vec::new())).unwrap();
        assert_eq!(reply.body, serde_json::json!([]));
    }
}
