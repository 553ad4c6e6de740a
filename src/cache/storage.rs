//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use std::sync::Mutex;

/// A cached query result as stored: serialized payload plus its age.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  pub data: String,
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
///
/// Entries are opaque serialized payloads; serialization policy lives in the
/// cache layer so storage backends stay object safe.
pub trait CacheStorage: Send + Sync {
  /// Store a query result under its hashed key.
  fn put(&self, key: &str, family: &str, description: &str, data: &str) -> Result<()>;

  /// Look up a cached query result.
  fn get(&self, key: &str) -> Result<Option<CachedEntry>>;

  /// Drop every entry in the given invalidation family.
  fn invalidate(&self, family: &str) -> Result<()>;

  /// Drop everything, e.g. when the signed-in principal changes.
  fn clear(&self) -> Result<()>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn put(&self, _key: &str, _family: &str, _description: &str, _data: &str) -> Result<()> {
    Ok(()) // Discard
  }

  fn get(&self, _key: &str) -> Result<Option<CachedEntry>> {
    Ok(None) // Always miss
  }

  fn invalidate(&self, _family: &str) -> Result<()> {
    Ok(())
  }

  fn clear(&self) -> Result<()> {
    Ok(())
  }
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Create a new SQLite storage at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  /// In-memory storage, used by tests.
  pub fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open cache database: {}", e))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Get the default database path.
  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("deskview").join("cache.db"))
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- Cached query results (serialized JSON payloads)
CREATE TABLE IF NOT EXISTS query_cache (
    query_hash TEXT PRIMARY KEY,
    family TEXT NOT NULL,
    query_description TEXT NOT NULL,
    data TEXT NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_query_cache_family ON query_cache(family);
"#;

impl CacheStorage for SqliteStorage {
  fn put(&self, key: &str, family: &str, description: &str, data: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO query_cache (query_hash, family, query_description, data, cached_at)
         VALUES (?, ?, ?, ?, datetime('now'))",
        params![key, family, description, data],
      )
      .map_err(|e| eyre!("Failed to store query result: {}", e))?;

    Ok(())
  }

  fn get(&self, key: &str) -> Result<Option<CachedEntry>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT data, cached_at FROM query_cache WHERE query_hash = ?")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let row: Option<(String, String)> = stmt
      .query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?)))
      .ok();

    match row {
      Some((data, cached_at_str)) => {
        let cached_at = parse_datetime(&cached_at_str)?;
        Ok(Some(CachedEntry { data, cached_at }))
      }
      None => Ok(None),
    }
  }

  fn invalidate(&self, family: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM query_cache WHERE family = ?", params![family])
      .map_err(|e| eyre!("Failed to invalidate cache family: {}", e))?;

    Ok(())
  }

  fn clear(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM query_cache", [])
      .map_err(|e| eyre!("Failed to clear cache: {}", e))?;

    Ok(())
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_put_get_roundtrip() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage
      .put("hash1", "tickets", "tickets page 1", r#"{"total":0}"#)
      .unwrap();

    let entry = storage.get("hash1").unwrap().expect("entry present");
    assert_eq!(entry.data, r#"{"total":0}"#);
  }

  #[test]
  fn test_get_missing_is_none() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    assert!(storage.get("nope").unwrap().is_none());
  }

  #[test]
  fn test_put_replaces_existing() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage.put("k", "tickets", "tickets page 1", "old").unwrap();
    storage.put("k", "tickets", "tickets page 1", "new").unwrap();
    assert_eq!(storage.get("k").unwrap().unwrap().data, "new");
  }

  #[test]
  fn test_invalidate_family_only() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage.put("a", "tickets", "tickets page 1", "1").unwrap();
    storage.put("b", "tickets", "tickets page 2", "2").unwrap();
    storage.put("c", "ticket_stats", "ticket stats", "3").unwrap();

    storage.invalidate("tickets").unwrap();

    assert!(storage.get("a").unwrap().is_none());
    assert!(storage.get("b").unwrap().is_none());
    assert!(storage.get("c").unwrap().is_some());
  }

  #[test]
  fn test_clear_drops_everything() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage.put("a", "tickets", "tickets page 1", "1").unwrap();
    storage.put("c", "profiles", "profiles", "3").unwrap();

    storage.clear().unwrap();

    assert!(storage.get("a").unwrap().is_none());
    assert!(storage.get("c").unwrap().is_none());
  }

  #[test]
  fn test_noop_storage_never_hits() {
    let storage = NoopStorage;
    storage.put("a", "tickets", "tickets page 1", "1").unwrap();
    assert!(storage.get("a").unwrap().is_none());
  }
}
