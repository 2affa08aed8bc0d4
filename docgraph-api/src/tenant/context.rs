//! Resolved tenant context of a request.

use docgraph_repository::{RequestContext, TenantId};
use docgraph_shared::{Document, Fields, Value};
use serde::Serialize;

/// The tenant ("instance") document a request is scoped to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instance {
    /// Identity path, e.g. `instances/main`.
    pub id: String,
    /// Host the instance was resolved for, without port.
    pub host: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub millis: i64,
    /// The instance document resolved without references.
    pub document: Document,
}

impl Instance {
    pub fn tenant_id(&self) -> TenantId {
        TenantId::new(self.id.clone())
    }

    /// Domains listed under `config.domains`.
    pub fn domains(&self) -> Vec<&str> {
        Value::lookup(self.document.fields(), "config.domains")
            .and_then(Value::as_array)
            .map(|domains| domains.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// The authenticated member behind a request: user profile fields overlaid with member fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    pub uid: String,
    /// Member document path, `<instance>/members/<uid>`.
    pub id: String,
    pub fields: Fields,
}

impl Principal {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Instance and principal of one request. Both are absent for unscoped guest requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenantContext {
    /// Requested host without port.
    pub host: String,
    pub instance: Option<Instance>,
    pub principal: Option<Principal>,
}

impl TenantContext {
    /// Core request context carrying the tenant and the authorization flag.
    pub fn request_context(&self, with_auth: bool) -> RequestContext {
        let ctx = RequestContext::guest().with_auth(with_auth);
        match &self.instance {
            Some(instance) => ctx.with_tenant(instance.tenant_id()),
            None => ctx,
        }
    }
}
