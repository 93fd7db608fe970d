//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheEntry, CacheStats};

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Current number of keys in cache
    pub keys: usize,
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Entries dropped after expiring
    pub expired: u64,
    /// New keys refused because the cache was full
    pub rejected: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            keys: stats.keys,
            hits: stats.hits,
            misses: stats.misses,
            expired: stats.expired,
            rejected: stats.rejected,
        }
    }
}

/// Response body for invalidation endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    /// Number of entries dropped
    pub removed: usize,
}

impl ClearResponse {
    pub fn new(scope: impl AsRef<str>, removed: usize) -> Self {
        Self {
            message: format!("Cleared {} entries ({})", removed, scope.as_ref()),
            removed,
        }
    }
}

/// One live cache entry as listed by GET /cache/entries
#[derive(Debug, Clone, Serialize)]
pub struct EntryInfo {
    pub key: String,
    pub tags: Vec<String>,
    pub ttl_remaining_secs: u64,
    /// Insertion time in ISO 8601 format
    pub cached_at: String,
}

impl From<&CacheEntry> for EntryInfo {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            key: entry.key.clone(),
            tags: entry.tags.clone(),
            ttl_remaining_secs: entry.ttl_remaining().as_secs(),
            cached_at: entry.cached_at.to_rfc3339(),
        }
    }
}

/// Response body for GET /cache/entries, sorted by key
#[derive(Debug, Clone, Serialize)]
pub struct EntriesResponse {
    pub count: usize,
    pub entries: Vec<EntryInfo>,
}

impl EntriesResponse {
    pub fn new(mut entries: Vec<EntryInfo>) -> Self {
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Self {
            count: entries.len(),
            entries,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
