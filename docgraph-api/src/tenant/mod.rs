//! Tenant and principal resolution.
//!
//! - [`TenantResolver`]: resolves the instance selected by the request host and the
//!   principal behind its bearer token
//! - [`TokenVerifier`]: verifies bearer tokens (the identity provider is external)
//! - [`SudoPolicy`]: decides whether a tenant context may see audit trails and skip caches

mod context;
mod policy;
mod resolver;
mod verifier;

pub use context::{Instance, Principal, TenantContext};
pub use policy::{DenySudo, RoleSudo, SudoPolicy};
pub use resolver::{TenantResolver, INSTANCES_COLLECTION, INSTANCE_TTL, MEMBERS_COLLECTION};
pub use verifier::{StaticTokenVerifier, TokenVerifier};
