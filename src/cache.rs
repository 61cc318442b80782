//! TTL cache for bridge GET responses, bounding the request rate against
//! the bridge.
//!
//! There is deliberately no single-flight deduplication: two handlers
//! racing on the same stale key will each run their fetcher. The fetches
//! are idempotent reads, so the only cost is a duplicate request.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::resource::ResourceKind;
use crate::Result;

/// Identifies one GET request: a resource kind, optionally narrowed to a
/// single id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ResourceKind,
    pub id: Option<String>,
}

impl CacheKey {
    pub fn list(kind: ResourceKind) -> CacheKey {
        CacheKey { kind, id: None }
    }

    pub fn single(kind: ResourceKind, id: impl Into<String>) -> CacheKey {
        CacheKey {
            kind,
            id: Some(id.into()),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}/{}", self.kind, id),
            None => write!(f, "{}", self.kind),
        }
    }
}

struct Entry {
    value: Arc<Value>,
    fetched_at: Instant,
}

pub struct ResourceCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl ResourceCache {
    pub fn new(ttl: Duration) -> ResourceCache {
        ResourceCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value if it is younger than the TTL, otherwise
    /// runs `fetcher`, stores its result, and returns it. A failed fetch
    /// stores nothing.
    pub async fn get<F, Fut>(&self, key: CacheKey, fetcher: F) -> Result<Arc<Value>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        if let Some(value) = self.lookup(&key) {
            log::debug!("cache hit for {key}");
            return Ok(value);
        }
        log::debug!("cache miss for {key}");
        let value = Arc::new(fetcher().await?);
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            key,
            Entry {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(value)
    }

    fn lookup(&self, key: &CacheKey) -> Option<Arc<Value>> {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Forces the next `get` for this key to refetch.
    pub fn invalidate(&self, key: &CacheKey) {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .remove(key);
    }

    /// Drops every entry, used by explicit refresh requests.
    pub fn clear(&self) {
        self.entries.lock().expect("cache mutex poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HueError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_fetcher(
        count: &Arc<AtomicUsize>,
        value: Value,
    ) -> impl FnOnce() -> std::future::Ready<Result<Value>> {
        let count = count.clone();
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(value))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn second_get_within_ttl_is_served_from_cache() {
        let cache = ResourceCache::new(Duration::from_secs(300));
        let fetches = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::list(ResourceKind::Light);

        let first = cache
            .get(key.clone(), counting_fetcher(&fetches, json!([1])))
            .await
            .unwrap();
        let second = cache
            .get(key, counting_fetcher(&fetches, json!([2])))
            .await
            .unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(*first, *second);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entry_is_refetched_not_served() {
        let cache = ResourceCache::new(Duration::from_secs(300));
        let fetches = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::list(ResourceKind::Room);

        cache
            .get(key.clone(), counting_fetcher(&fetches, json!([1])))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(301)).await;
        let refetched = cache
            .get(key, counting_fetcher(&fetches, json!([2])))
            .await
            .unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(*refetched, json!([2]));
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_refetch() {
        let cache = ResourceCache::new(Duration::from_secs(300));
        let fetches = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::single(ResourceKind::Light, "L1");

        cache
            .get(key.clone(), counting_fetcher(&fetches, json!([1])))
            .await
            .unwrap();
        cache.invalidate(&key);
        cache
            .get(key, counting_fetcher(&fetches, json!([1])))
            .await
            .unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_is_not_cached() {
        let cache = ResourceCache::new(Duration::from_secs(300));
        let fetches = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::list(ResourceKind::Zone);

        let failing = {
            let fetches = fetches.clone();
            move || {
                fetches.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err(HueError::BridgeError {
                    description: "unreachable".to_string(),
                }))
            }
        };
        assert!(cache.get(key.clone(), failing).await.is_err());

        cache
            .get(key, counting_fetcher(&fetches, json!([1])))
            .await
            .unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cache_key_display_includes_optional_id() {
        assert_eq!(CacheKey::list(ResourceKind::Light).to_string(), "light");
        assert_eq!(
            CacheKey::single(ResourceKind::Room, "R1").to_string(),
            "room/R1"
        );
    }
}
