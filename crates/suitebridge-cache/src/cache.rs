//! In-memory TTL cache (`spec.md` §3 `CacheEntry`, §4.5).
//!
//! Entries expire five minutes after insertion (configurable); eviction
//! is lazy, checked on read. No background sweeper, no size cap — the
//! working set is bounded by the client's question space.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::RwLock;

struct Entry {
    value: Value,
    inserted_at: Instant,
}

/// A read-mostly, TTL-expiring cache keyed by the canonical strings
/// [`crate::key::cache_key`] produces. No entry is ever mutated in
/// place — a write always replaces the whole entry.
pub struct Cache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl Cache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached value if present and not yet expired. An
    /// expired entry is not removed here; [`Cache::get`] is read-only by
    /// design (lazy eviction happens on the next `set` that touches the
    /// same key, or can be swept explicitly via [`Cache::evict_expired`]).
    pub async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        entries.get(key).and_then(|entry| {
            if entry.inserted_at.elapsed() < self.ttl {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    pub async fn set(&self, key: String, value: Value) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Remove every expired entry. Not required for correctness (reads
    /// already ignore expired entries) but keeps long-running processes
    /// from accumulating dead keys indefinitely.
    pub async fn evict_expired(&self) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hit_returns_the_value_it_was_populated_with() {
        let cache = Cache::new(Duration::from_secs(300));
        cache.set("k".to_string(), serde_json::json!(42)).await;
        assert_eq!(cache.get("k").await, Some(serde_json::json!(42)));
    }

    #[tokio::test]
    async fn miss_on_unknown_key() {
        let cache = Cache::new(Duration::from_secs(300));
        assert_eq!(cache.get("missing").await, None);
    }

    #[tokio::test]
    async fn entry_older_than_ttl_is_treated_as_a_miss() {
        let cache = Cache::new(Duration::from_millis(10));
        cache.set("k".to_string(), serde_json::json!(1)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn set_replaces_rather_than_mutates() {
        let cache = Cache::new(Duration::from_secs(300));
        cache.set("k".to_string(), serde_json::json!(1)).await;
        cache.set("k".to_string(), serde_json::json!(2)).await;
        assert_eq!(cache.get("k").await, Some(serde_json::json!(2)));
    }

    #[tokio::test]
    async fn evict_expired_removes_only_stale_entries() {
        let cache = Cache::new(Duration::from_millis(10));
        cache.set("stale".to_string(), serde_json::json!(1)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.set("fresh".to_string(), serde_json::json!(2)).await;
        cache.evict_expired().await;
        assert_eq!(cache.len().await, 1);
    }
}
