//! In-memory cache implementation using the moka crate.
//!
//! moka only knows a cache-wide TTL, so every entry carries its own deadline
//! on the tokio clock and is treated as absent once that passes.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tokio::time::Instant;

use orderhub_core::config::cache::MemoryCacheConfig;
use orderhub_core::result::AppResult;
use orderhub_core::traits::cache::CacheProvider;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// In-memory cache provider using moka.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    /// The underlying moka cache.
    cache: Cache<String, Entry>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.time_to_live_seconds))
            .build();

        Self { cache }
    }

    async fn live_entry(&self, key: &str) -> Option<Entry> {
        match self.cache.get(key).await {
            Some(entry) if entry.is_live() => Some(entry),
            Some(_) => {
                self.cache.invalidate(key).await;
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.live_entry(key).await.map(|e| e.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.cache
            .insert(key.to_string(), Entry::new(value.to_string(), ttl))
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn take(&self, key: &str) -> AppResult<Option<String>> {
        // `remove` hands the value to exactly one caller.
        Ok(self
            .cache
            .remove(key)
            .await
            .filter(Entry::is_live)
            .map(|e| e.value))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
