//! In-memory response cache for upstream payloads.
//!
//! Entries are keyed by `url-{json params}` and never evicted on their own;
//! staleness is decided at read time against the caller's TTL.

use common::QueryParams;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cached upstream payload with staleness tracking.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Value,
    pub stored_at: Instant,
}

impl CacheEntry {
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Build the cache key for a request.
pub fn cache_key(url: &str, params: &QueryParams) -> String {
    format!("{}-{}", url, params.to_json_string())
}

/// Thread-safe response cache. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload for `key` if it was stored less than `ttl` ago.
    pub fn get_fresh(&self, key: &str, ttl: Duration) -> Option<Value> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(ttl))
            .map(|entry| entry.payload.clone())
    }

    /// Store (or overwrite) a payload with a fresh timestamp.
    pub fn insert(&self, key: String, payload: Value) {
        self.entries.insert(
            key,
            CacheEntry {
                payload,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry older than `ttl`. Returns how many were removed.
    pub fn purge_expired(&self, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(ttl));
        before - self.entries.len()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_key_combines_url_and_params() {
        let params = QueryParams::new().with("apikey", "demo");
        assert_eq!(
            cache_key("https://x.test/quote/AAPL", &params),
            r#"https://x.test/quote/AAPL-{"apikey":"demo"}"#
        );
    }

    #[test]
    fn test_cache_key_differs_by_params() {
        let a = QueryParams::new().with("from", "2024-01-01").with("apikey", "k");
        let b = QueryParams::new().with("from", "2024-01-02").with("apikey", "k");
        assert_ne!(cache_key("u", &a), cache_key("u", &b));
    }

    #[test]
    fn test_fresh_entry_is_returned() {
        let cache = ResponseCache::new();
        cache.insert("k".into(), json!([1, 2, 3]));
        assert_eq!(
            cache.get_fresh("k", Duration::from_secs(300)),
            Some(json!([1, 2, 3]))
        );
        assert!(cache.get_fresh("missing", Duration::from_secs(300)).is_none());
    }

    #[test]
    fn test_stale_entry_is_ignored_but_kept() {
        let cache = ResponseCache::new();
        cache.insert("k".into(), json!({"a": 1}));
        std::thread::sleep(Duration::from_millis(20));

        assert!(cache.get_fresh("k", Duration::from_millis(5)).is_none());
        assert!(cache.contains("k"), "stale entries stay until overwritten");
    }

    #[test]
    fn test_purge_expired() {
        let cache = ResponseCache::new();
        cache.insert("old".into(), json!(1));
        std::thread::sleep(Duration::from_millis(20));
        cache.insert("new".into(), json!(2));

        let removed = cache.purge_expired(Duration::from_millis(10));
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("new"));
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = ResponseCache::new();
        let other = cache.clone();
        other.insert("k".into(), json!("v"));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(other.is_empty());
    }
}
