use async_trait::async_trait;
use std::time::Duration;

/// Async key-value cache with per-entry freshness.
#[async_trait]
pub trait Cache<K, V>: Send + Sync {
    /// Returns the value for `key` while it is still fresh.
    async fn get(&self, key: &K) -> Option<V>;
    async fn put(&self, key: K, value: V, ttl: Option<Duration>);
    async fn remove(&self, key: &K);
    async fn clear(&self);
    /// Evicts entries nobody has read within the collection horizon and
    /// returns how many were dropped.
    async fn collect_garbage(&self) -> usize;
}
