//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Semantic identifier for a cached query result.
///
/// A key belongs to an invalidation family: mutating a ticket invalidates
/// every key in the "tickets" family at once, regardless of page.
pub trait QueryKey {
  /// Invalidation group this key belongs to (e.g. "tickets").
  fn family(&self) -> &'static str;

  /// Human-readable description, unique within the family
  /// (e.g. "tickets page 2").
  fn description(&self) -> String;

  /// Stable, fixed-length storage key.
  fn cache_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.family().as_bytes());
    hasher.update(b":");
    hasher.update(self.description().as_bytes());
    hex::encode(hasher.finalize())
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      cached_at: Some(cached_at),
    }
  }

  /// Create a new cache result for offline mode.
  pub fn offline(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still considered fresh
  CacheFresh,
  /// Offline mode - network unavailable, serving cached data
  Offline,
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Key(&'static str, String);

  impl QueryKey for Key {
    fn family(&self) -> &'static str {
      self.0
    }
    fn description(&self) -> String {
      self.1.clone()
    }
  }

  #[test]
  fn test_cache_hash_is_stable_and_distinct() {
    let a = Key("tickets", "tickets page 1".to_string());
    let b = Key("tickets", "tickets page 2".to_string());
    assert_eq!(a.cache_hash(), a.cache_hash());
    assert_ne!(a.cache_hash(), b.cache_hash());
    // Fixed-length hex
    assert_eq!(a.cache_hash().len(), 64);
  }
}
