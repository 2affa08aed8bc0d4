//! Expiring caches shared across requests.
//!
//! - [`TtlCache`]: in-memory map with a fixed expiry per entry
//! - [`ResponseCache`]: caches serialized API responses, bypassed for privileged callers

mod response_cache;
mod ttl_cache;

pub use response_cache::{ResponseCache, RESPONSE_TTL};
pub use ttl_cache::TtlCache;
