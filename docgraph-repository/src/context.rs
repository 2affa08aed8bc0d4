//! Explicit per-request context.
//!
//! The tenant, the authorization flag and the deadline are threaded through every resolver
//! and paginator call. Nothing here is global or cached across requests.

use std::future::Future;
use std::time::Duration;

use tokio::time::{timeout, Instant};

use crate::errors::DocGraphError;

/// Identity path of the tenant ("instance") document, e.g. `instances/main`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub tenant: Option<TenantId>,
    /// Gates exposure of audit trail fields.
    pub with_auth: bool,
    pub deadline: Option<Instant>,
}

impl RequestContext {
    /// Unauthorized context without tenant or deadline.
    pub fn guest() -> Self {
        Self::default()
    }

    /// Context allowed to see audit trail fields.
    pub fn authorized() -> Self {
        Self {
            with_auth: true,
            ..Self::default()
        }
    }

    pub fn with_tenant(mut self, tenant: TenantId) -> Self {
        self.tenant = Some(tenant);
        self
    }

    pub fn with_auth(mut self, with_auth: bool) -> Self {
        self.with_auth = with_auth;
        self
    }

    /// Fail any store call issued later than `budget` from now.
    pub fn with_deadline(mut self, budget: Duration) -> Self {
        self.deadline = Some(Instant::now() + budget);
        self
    }

    /// Time a store call may take: `per_call`, shortened to what is left of the deadline.
    pub fn budget(&self, per_call: Duration, operation: &str) -> Result<Duration, DocGraphError> {
        match self.deadline {
            None => Ok(per_call),
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(DocGraphError::timeout(operation, Duration::ZERO));
                }
                Ok(per_call.min(deadline - now))
            }
        }
    }

    /// Run a store call under this context's deadline.
    pub async fn bounded<T, F>(
        &self,
        per_call: Duration,
        operation: &str,
        call: F,
    ) -> Result<T, DocGraphError>
    where
        F: Future<Output = Result<T, DocGraphError>>,
    {
        let budget = self.budget(per_call, operation)?;

        match timeout(budget, call).await {
            Ok(result) => result,
            Err(_) => Err(DocGraphError::timeout(operation, budget)),
        }
    }
}
