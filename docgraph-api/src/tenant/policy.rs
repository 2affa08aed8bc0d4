//! Privilege policies.

use std::collections::HashSet;

use docgraph_shared::Value;

use super::context::TenantContext;

/// Decides whether a tenant context is privileged ("sudo").
///
/// Privileged contexts see audit trail fields and bypass the response cache.
pub trait SudoPolicy: Send + Sync {
    fn is_sudo(&self, tenant: &TenantContext) -> bool;
}

/// Nobody is privileged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenySudo;

impl SudoPolicy for DenySudo {
    fn is_sudo(&self, _tenant: &TenantContext) -> bool {
        false
    }
}

/// Members whose `role` field is one of the configured roles are privileged.
#[derive(Debug, Clone, Default)]
pub struct RoleSudo {
    roles: HashSet<String>,
}

impl RoleSudo {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

impl SudoPolicy for RoleSudo {
    fn is_sudo(&self, tenant: &TenantContext) -> bool {
        tenant
            .principal
            .as_ref()
            .and_then(|principal| principal.get("role"))
            .and_then(Value::as_str)
            .is_some_and(|role| self.roles.contains(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::Principal;
    use docgraph_shared::Fields;

    fn with_role(role: &str) -> TenantContext {
        let mut fields = Fields::new();
        fields.insert("role".into(), Value::from(role));
        TenantContext {
            principal: Some(Principal {
                uid: "u1".into(),
                id: "instances/main/members/u1".into(),
                fields,
            }),
            ..TenantContext::default()
        }
    }

    #[test]
    fn test_role_sudo() {
        let policy = RoleSudo::new(["admin"]);
        assert!(policy.is_sudo(&with_role("admin")));
        assert!(!policy.is_sudo(&with_role("editor")));
        assert!(!policy.is_sudo(&TenantContext::default()));
        assert!(!DenySudo.is_sudo(&with_role("admin")));
    }
}
