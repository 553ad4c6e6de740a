//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{Duration, Utc};
use color_eyre::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::storage::CacheStorage;
use super::traits::{CacheResult, QueryKey};

/// Cache layer that manages caching logic and network fetching.
///
/// This layer sits between the application and the network client,
/// providing transparent caching with offline support.
#[derive(Clone)]
pub struct CacheLayer {
  storage: Arc<dyn CacheStorage>,
  /// How long before cached data is considered stale
  stale_time: Duration,
}

impl CacheLayer {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
    Self {
      storage,
      stale_time: Duration::seconds(30),
    }
  }

  /// Set the stale time for cached data.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  /// Check if cached data is stale based on cached_at timestamp.
  fn is_stale(&self, cached_at: chrono::DateTime<Utc>) -> bool {
    Utc::now() - cached_at > self.stale_time
  }

  /// Fetch a query result with cache-first strategy.
  ///
  /// 1. Check cache - if fresh, return immediately
  /// 2. If stale/missing, fetch from network
  /// 3. On network failure, return stale cache (offline mode)
  /// 4. Update cache with new data
  pub async fn fetch<T, K, F, Fut>(&self, key: &K, fetcher: F) -> Result<CacheResult<T>>
  where
    T: Serialize + DeserializeOwned,
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let hash = key.cache_hash();

    // An entry that no longer deserializes (schema drift) counts as a miss.
    let cached = self.storage.get(&hash)?.and_then(|entry| {
      serde_json::from_str::<T>(&entry.data)
        .ok()
        .map(|data| (data, entry.cached_at))
    });

    match cached {
      Some((data, cached_at)) if !self.is_stale(cached_at) => {
        Ok(CacheResult::from_cache(data, cached_at))
      }
      Some((data, cached_at)) => {
        // Cache is stale, try to fetch from network
        match fetcher().await {
          Ok(fresh) => {
            self.store(key, &hash, &fresh)?;
            Ok(CacheResult::from_network(fresh))
          }
          Err(e) => {
            // Network failed, return stale cache (offline mode)
            debug!("Serving stale cache for {}: {}", key.description(), e);
            Ok(CacheResult::offline(data, cached_at))
          }
        }
      }
      None => {
        // No cache, must fetch from network
        let fresh = fetcher().await?;
        self.store(key, &hash, &fresh)?;
        Ok(CacheResult::from_network(fresh))
      }
    }
  }

  fn store<T: Serialize, K: QueryKey>(&self, key: &K, hash: &str, data: &T) -> Result<()> {
    let serialized = serde_json::to_string(data)?;
    self
      .storage
      .put(hash, key.family(), &key.description(), &serialized)
  }

  /// Drop every cached result in the given family.
  pub fn invalidate(&self, family: &str) {
    if let Err(e) = self.storage.invalidate(family) {
      warn!("Failed to invalidate cache family {}: {}", family, e);
    }
  }

  /// Drop the entire cache, e.g. after the signed-in principal changed.
  pub fn clear(&self) {
    if let Err(e) = self.storage.clear() {
      warn!("Failed to clear cache: {}", e);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::storage::SqliteStorage;
  use crate::cache::traits::CacheSource;
  use color_eyre::eyre::eyre;
  use std::sync::atomic::{AtomicU32, Ordering};

  struct TestKey(u32);

  impl QueryKey for TestKey {
    fn family(&self) -> &'static str {
      "tickets"
    }
    fn description(&self) -> String {
      format!("tickets page {}", self.0)
    }
  }

  fn layer() -> CacheLayer {
    CacheLayer::new(Arc::new(SqliteStorage::open_in_memory().unwrap()))
  }

  #[tokio::test]
  async fn test_first_fetch_hits_network() {
    let layer = layer();
    let calls = AtomicU32::new(0);
    let calls = &calls;

    let result = layer
      .fetch(&TestKey(1), move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![1, 2, 3])
      })
      .await
      .unwrap();

    assert_eq!(result.data, vec![1, 2, 3]);
    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_fresh_cache_skips_network() {
    let layer = layer();
    let calls = AtomicU32::new(0);
    let calls = &calls;

    for _ in 0..2 {
      layer
        .fetch(&TestKey(1), move || async move {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(vec![1, 2, 3])
        })
        .await
        .unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_stale_cache_refetches() {
    let layer = layer().with_stale_time(Duration::seconds(-1));
    let calls = AtomicU32::new(0);
    let calls = &calls;

    for _ in 0..2 {
      layer
        .fetch(&TestKey(1), move || async move {
          Ok(calls.fetch_add(1, Ordering::SeqCst))
        })
        .await
        .unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_stale_cache_served_when_network_fails() {
    let layer = layer().with_stale_time(Duration::seconds(-1));

    layer
      .fetch(&TestKey(1), || async { Ok(vec![42]) })
      .await
      .unwrap();

    let result = layer
      .fetch::<Vec<i32>, _, _, _>(&TestKey(1), || async { Err(eyre!("network down")) })
      .await
      .unwrap();

    assert_eq!(result.data, vec![42]);
    assert_eq!(result.source, CacheSource::Offline);
  }

  #[tokio::test]
  async fn test_invalidate_forces_refetch() {
    let layer = layer();
    let calls = AtomicU32::new(0);
    let calls = &calls;

    let fetch = move || async move {
      calls.fetch_add(1, Ordering::SeqCst);
      Ok(7u32)
    };

    layer.fetch(&TestKey(1), fetch).await.unwrap();
    layer.invalidate("tickets");
    layer.fetch(&TestKey(1), fetch).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_clear_drops_all_families() {
    let layer = layer();
    let calls = AtomicU32::new(0);
    let calls = &calls;

    let fetch = move || async move {
      calls.fetch_add(1, Ordering::SeqCst);
      Ok(7u32)
    };

    layer.fetch(&TestKey(1), fetch).await.unwrap();
    layer.clear();
    layer.fetch(&TestKey(1), fetch).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }
}
