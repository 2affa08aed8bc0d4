//! Collection read guards.

use std::collections::HashSet;

use crate::tenant::TenantContext;

/// Decides which collections a tenant context may read.
pub trait CollectionAccess: Send + Sync {
    /// Root collection, e.g. `/api/all/<collection>`.
    fn can_read(&self, collection: &str, tenant: &TenantContext) -> bool;

    /// Collection nested under the instance, e.g. `/api/instance/all/<collection>`.
    fn can_read_instance(&self, collection: &str, tenant: &TenantContext) -> bool;
}

/// Every collection is readable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl CollectionAccess for AllowAll {
    fn can_read(&self, _collection: &str, _tenant: &TenantContext) -> bool {
        true
    }

    fn can_read_instance(&self, _collection: &str, _tenant: &TenantContext) -> bool {
        true
    }
}

/// Only the listed collections are readable. Authenticated members may additionally read
/// the collections listed as member-only.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    root: HashSet<String>,
    instance: HashSet<String>,
    members_only: HashSet<String>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.root.extend(collections.into_iter().map(Into::into));
        self
    }

    pub fn instance<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instance.extend(collections.into_iter().map(Into::into));
        self
    }

    /// Instance collections readable by authenticated members only.
    pub fn members_only<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members_only
            .extend(collections.into_iter().map(Into::into));
        self
    }
}

impl CollectionAccess for AllowList {
    fn can_read(&self, collection: &str, _tenant: &TenantContext) -> bool {
        self.root.contains(collection)
    }

    fn can_read_instance(&self, collection: &str, tenant: &TenantContext) -> bool {
        self.instance.contains(collection)
            || (tenant.principal.is_some() && self.members_only.contains(collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::Principal;
    use docgraph_shared::Fields;

    #[test]
    fn test_allow_list() {
        let access = AllowList::new()
            .root(["instances"])
            .instance(["products"])
            .members_only(["orders"]);
        let guest = TenantContext::default();
        let member = TenantContext {
            principal: Some(Principal {
                uid: "u1".into(),
                id: "instances/main/members/u1".into(),
                fields: Fields::new(),
            }),
            ..TenantContext::default()
        };

        assert!(access.can_read("instances", &guest));
        assert!(!access.can_read("users", &guest));
        assert!(access.can_read_instance("products", &guest));
        assert!(!access.can_read_instance("orders", &guest));
        assert!(access.can_read_instance("orders", &member));
        assert!(AllowAll.can_read("anything", &guest));
    }
}
