use crate::core::cache::Cache;
use crate::core::currency::{ConversionQuote, ConversionRequest, Currency, CurrencyRateProvider};
use crate::store::memory::MemoryCache;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

const CURRENCIES_KEY: &str = "currencies";

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, String>>>;

/// Concurrent fetches for the same key share a single underlying future.
struct InFlight<K, V> {
    pending: Mutex<HashMap<K, SharedFetch<V>>>,
}

impl<K, V> InFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    async fn join<F>(&self, key: K, fetch: F) -> Result<V, String>
    where
        F: FnOnce() -> BoxFuture<'static, Result<V, String>>,
    {
        let shared = {
            let mut pending = self.pending.lock().await;
            pending
                .entry(key.clone())
                .or_insert_with(|| fetch().shared())
                .clone()
        };
        let result = shared.clone().await;

        let mut pending = self.pending.lock().await;
        if pending.get(&key).is_some_and(|f| f.ptr_eq(&shared)) {
            pending.remove(&key);
        }
        result
    }
}

#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub currencies_ttl: Duration,
    pub conversion_ttl: Duration,
    pub gc_after: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            currencies_ttl: Duration::from_secs(60 * 60),
            conversion_ttl: Duration::from_secs(2 * 60),
            gc_after: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Caching and request coalescing for any [`CurrencyRateProvider`].
///
/// Successful responses are served from memory while fresh. Failures are
/// handed to every waiting caller but never stored.
pub struct CachingRateProvider<T: CurrencyRateProvider> {
    inner: Arc<T>,
    policy: CachePolicy,
    currencies: MemoryCache<String, Vec<Currency>>,
    conversions: MemoryCache<ConversionRequest, ConversionQuote>,
    currencies_in_flight: InFlight<String, Vec<Currency>>,
    conversions_in_flight: InFlight<ConversionRequest, ConversionQuote>,
}

impl<T: CurrencyRateProvider> CachingRateProvider<T> {
    pub fn new(inner: T, policy: CachePolicy) -> Self {
        Self {
            inner: Arc::new(inner),
            currencies: MemoryCache::with_gc_after(policy.gc_after),
            conversions: MemoryCache::with_gc_after(policy.gc_after),
            currencies_in_flight: InFlight::new(),
            conversions_in_flight: InFlight::new(),
            policy,
        }
    }
}

#[async_trait]
impl<T: CurrencyRateProvider + 'static> CurrencyRateProvider for CachingRateProvider<T> {
    async fn fetch_currencies(&self) -> Result<Vec<Currency>> {
        self.currencies.collect_garbage().await;

        let key = CURRENCIES_KEY.to_string();
        if let Some(cached) = self.currencies.get(&key).await {
            return Ok(cached);
        }

        debug!("Fetching currency list");
        let inner = Arc::clone(&self.inner);
        let result = self
            .currencies_in_flight
            .join(key.clone(), move || {
                async move { inner.fetch_currencies().await.map_err(|e| e.to_string()) }.boxed()
            })
            .await;

        match result {
            Ok(currencies) => {
                self.currencies
                    .put(key, currencies.clone(), Some(self.policy.currencies_ttl))
                    .await;
                Ok(currencies)
            }
            Err(e) => Err(anyhow!(e)),
        }
    }

    async fn convert(&self, from: &str, to: &str, amount: f64) -> Result<ConversionQuote> {
        self.conversions.collect_garbage().await;

        let key = ConversionRequest::new(from, to, amount);
        if let Some(cached) = self.conversions.get(&key).await {
            return Ok(cached);
        }

        debug!(request = ?key, "Fetching conversion");
        let inner = Arc::clone(&self.inner);
        let request = key.clone();
        let result = self
            .conversions_in_flight
            .join(key.clone(), move || {
                async move {
                    inner
                        .convert(&request.from, &request.to, request.amount)
                        .await
                        .map_err(|e| e.to_string())
                }
                .boxed()
            })
            .await;

        match result {
            Ok(quote) => {
                self.conversions
                    .put(key, quote.clone(), Some(self.policy.conversion_ttl))
                    .await;
                Ok(quote)
            }
            Err(e) => Err(anyhow!(e)),
        }
    }
}
