//! Cache Store Module
//!
//! In-memory response cache with TTL expiration, a key-count ceiling and a
//! tag index for selective invalidation.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde_json::Value;

use crate::cache::{CacheEntry, CacheStats};
use crate::error::CacheError;

// == Cache Store ==
/// Owns every cached entry.
///
/// All operations are synchronous and never touch the network. Share it
/// between tasks through [`crate::cache::SharedCache`].
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Tag to keys carrying that tag
    tags: HashMap<String, HashSet<String>>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of distinct keys allowed
    max_keys: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store that holds at most `max_keys` keys.
    pub fn new(max_keys: usize) -> Self {
        Self {
            entries: HashMap::new(),
            tags: HashMap::new(),
            stats: CacheStats::new(),
            max_keys,
        }
    }

    // == Set ==
    /// Stores a value under `key` for `ttl_seconds`.
    pub fn set(&mut self, key: String, value: Value, ttl_seconds: u64) -> Result<(), CacheError> {
        self.set_tagged(key, value, ttl_seconds, Vec::new())
    }

    /// Stores a value with invalidation tags.
    ///
    /// Replacing an existing key always succeeds. A new key is refused with
    /// [`CacheError::CapacityExceeded`] when the store is full, after expired
    /// entries have been reclaimed.
    pub fn set_tagged(
        &mut self,
        key: String,
        value: Value,
        ttl_seconds: u64,
        tags: Vec<String>,
    ) -> Result<(), CacheError> {
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.max_keys {
            self.cleanup_expired();
            if self.entries.len() >= self.max_keys {
                self.stats.record_rejected();
                return Err(CacheError::CapacityExceeded {
                    max_keys: self.max_keys,
                });
            }
        }

        if is_overwrite {
            self.remove_entry(&key);
        }

        for tag in &tags {
            self.tags.entry(tag.clone()).or_default().insert(key.clone());
        }
        let entry = CacheEntry::new(key.clone(), value, ttl_seconds, tags);
        self.entries.insert(key, entry);

        self.stats.set_keys(self.entries.len());
        Ok(())
    }

    // == Get ==
    /// Returns the live value for `key`.
    ///
    /// Counts a hit or a miss. Expired entries are removed here even if the
    /// periodic sweep has not reached them yet.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                let value = entry.value.clone();
                self.stats.record_hit();
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expired(1);
            self.stats.set_keys(self.entries.len());
        }
        self.stats.record_miss();
        None
    }

    // == Delete ==
    /// Removes `key`, returning whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.remove_entry(key).is_some();
        self.stats.set_keys(self.entries.len());
        removed
    }

    /// Removes every entry matching `predicate` and returns how many went.
    pub fn delete_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&CacheEntry) -> bool,
    {
        let doomed: Vec<String> = self
            .entries
            .values()
            .filter(|entry| predicate(entry))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &doomed {
            self.remove_entry(key);
        }
        self.stats.set_keys(self.entries.len());
        doomed.len()
    }

    /// Removes every entry tagged with `tag`.
    pub fn invalidate_tag(&mut self, tag: &str) -> usize {
        let keys: Vec<String> = match self.tags.get(tag) {
            Some(keys) => keys.iter().cloned().collect(),
            None => return 0,
        };

        for key in &keys {
            self.remove_entry(key);
        }
        self.stats.set_keys(self.entries.len());
        keys.len()
    }

    /// Drops everything. Counters are kept.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.tags.clear();
        self.stats.set_keys(0);
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_keys(self.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired_keys: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        self.stats.record_expired(expired_keys.len());
        self.stats.set_keys(self.entries.len());
        expired_keys.len()
    }

    /// Live (unexpired) entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        let now = Instant::now();
        self.entries.values().filter(move |entry| !entry.is_expired_at(now))
    }

    /// Keys currently tagged with `tag`.
    pub fn keys_for_tag(&self, tag: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .tags
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    // Removes an entry and unlinks it from the tag index.
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        for tag in &entry.tags {
            if let Some(keys) = self.tags.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tags.remove(tag);
                }
            }
        }
        Some(entry)
    }
}
