use crate::core::cache::Cache;
use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

struct CacheValue<V> {
    value: V,
    fresh_until: Option<Instant>,
    last_access: Instant,
}

/// In-memory cache implementation using HashMap and Mutex.
///
/// Entries past their TTL are no longer served but stay around until they
/// have gone unread for longer than the collection horizon.
pub struct MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<HashMap<K, CacheValue<V>>>>,
    gc_after: Option<Duration>,
}

impl<K, V> MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Creates a new MemoryCache instance that never evicts
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            gc_after: None,
        }
    }

    pub fn with_gc_after(gc_after: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            gc_after: Some(gc_after),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<K, V> Default for MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.inner.lock().await;
        if let Some(entry) = cache.get_mut(key) {
            let now = Instant::now();
            entry.last_access = now;
            if let Some(fresh_until) = entry.fresh_until {
                if fresh_until <= now {
                    debug!("Cache entry stale for key: {:?}", key);
                    return None;
                }
            }
            debug!("Cache HIT for key: {:?}", key);
            return Some(entry.value.clone());
        }
        debug!("Cache MISS for key: {:?}", key);
        None
    }

    async fn put(&self, key: K, value: V, ttl: Option<Duration>) {
        let now = Instant::now();
        let cache_value = CacheValue {
            value,
            fresh_until: ttl.map(|duration| now + duration),
            last_access: now,
        };

        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {:?}", key);
        cache.insert(key, cache_value);
    }

    async fn remove(&self, key: &K) {
        let mut cache = self.inner.lock().await;
        cache.remove(key);
        debug!("Cache REMOVE for key: {:?}", key);
    }

    async fn clear(&self) {
        let mut cache = self.inner.lock().await;
        cache.clear();
        debug!("Cache CLEAR");
    }

    async fn collect_garbage(&self) -> usize {
        let Some(gc_after) = self.gc_after else {
            return 0;
        };
        let now = Instant::now();
        let mut cache = self.inner.lock().await;
        let before = cache.len();
        cache.retain(|_, entry| now.duration_since(entry.last_access) < gc_after);
        let evicted = before - cache.len();
        if evicted > 0 {
            debug!("Cache GC evicted {} entries", evicted);
        }
        evicted
    }
}
