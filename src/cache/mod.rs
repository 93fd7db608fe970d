//! Cache Module
//!
//! In-memory response caching: key derivation, TTL selection, and the
//! store with its statistics.

mod entry;
mod key;
mod stats;
mod store;
mod ttl;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::CacheEntry;
pub use key::{derive_key, ParamValue, QueryParams};
pub use stats::CacheStats;
pub use store::CacheStore;
pub use ttl::{RequestCategory, TtlPolicy, ID_PARAM};

/// A cache store shared between request tasks.
///
/// Locks are held only for a single store call and never across an await.
pub type SharedCache = Arc<RwLock<CacheStore>>;

/// Wraps a store for sharing.
pub fn shared(store: CacheStore) -> SharedCache {
    Arc::new(RwLock::new(store))
}
