use crate::error::{CacheError, Result};
use crate::redis_cache::Cache;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// In-process cache with TTL expiry and `*`-glob pattern deletion. Mirrors
/// the Redis backend closely enough to stand in for it in tests.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Match a Redis-style pattern supporting only the `*` wildcard.
fn glob_match(pattern: &str, key: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    if segments.len() == 1 {
        return pattern == key;
    }

    let mut rest = key;
    for (i, segment) in segments.iter().enumerate() {
        if i == 0 {
            match rest.strip_prefix(segment) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == segments.len() - 1 {
            return segment.is_empty() || rest.ends_with(segment);
        } else if segment.is_empty() {
            continue;
        } else {
            match rest.find(segment) {
                Some(pos) => rest = &rest[pos + segment.len()..],
                None => return false,
            }
        }
    }
    true
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CacheError::Other("cache lock poisoned".to_string()))?;
        Ok(entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CacheError::Other("cache lock poisoned".to_string()))?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<u64> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CacheError::Other("cache lock poisoned".to_string()))?;
        let before = entries.len();
        entries.retain(|key, _| !glob_match(pattern, key));
        Ok((before - entries.len()) as u64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_matches_prefix_and_infix() {
        assert!(glob_match("check:document:d1:*", "check:document:d1:viewer:user:alice"));
        assert!(glob_match("check:*:user:alice", "check:document:d1:viewer:user:alice"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exact-not"));
        assert!(!glob_match("check:document:d2:*", "check:document:d1:viewer:user:alice"));
        assert!(!glob_match("check:*:user:bob", "check:document:d1:viewer:user:alice"));
        assert!(glob_match("*", "anything"));
    }

    #[tokio::test]
    async fn set_get_and_pattern_delete() {
        let cache = MemoryCache::new();
        cache.set("check:document:d1:viewer:user:alice", "x", 60).await.unwrap();
        cache.set("check:document:d1:owner:user:bob", "y", 60).await.unwrap();
        cache.set("check:team:t1:member:user:bob", "z", 60).await.unwrap();

        assert_eq!(
            cache.get("check:document:d1:viewer:user:alice").await.unwrap(),
            Some("x".to_string())
        );

        let removed = cache.delete_pattern("check:document:d1:*").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::new();
        cache.set("short-lived", "v", 1).await.unwrap();
        assert!(cache.get("short-lived").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(cache.get("short-lived").await.unwrap().is_none());
    }
}
