//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Stand-in lifetime for TTLs too large to represent as an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 86_400);

// == Cache Entry ==
/// A cached upstream response. Entries are never mutated after creation;
/// storing the same key again replaces the whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    /// The parsed response body
    pub value: Value,
    pub inserted_at: Instant,
    pub expires_at: Instant,
    /// Wall-clock insertion time, for display only
    pub cached_at: DateTime<Utc>,
    /// Category labels used for invalidation
    pub tags: Vec<String>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry that lives for `ttl_seconds`.
    ///
    /// A TTL past what the clock can represent is capped at roughly a
    /// century.
    pub fn new(key: String, value: Value, ttl_seconds: u64, tags: Vec<String>) -> Self {
        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(ttl_seconds))
            .unwrap_or(now + FAR_FUTURE);
        Self {
            key,
            value,
            inserted_at: now,
            expires_at,
            cached_at: Utc::now(),
            tags,
        }
    }

    // == Is Expired ==
    /// An entry is expired once `now` reaches `expires_at`, so a zero TTL
    /// entry is never served.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
