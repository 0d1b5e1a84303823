//! Cache storage trait and SQLite implementation.

use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use super::traits::{CacheEntry, CacheStatus, RawDocument};
use crate::error::{Error, Result};

/// Trait for cache storage backends.
///
/// Backends know nothing about expiry; the caller hands them a cutoff and
/// they return rows written strictly after it.
pub trait CacheStorage: Send + Sync {
  /// Create the schema if it is missing. Safe to call any number of times.
  fn initialize(&self) -> Result<()>;

  /// Write a whole batch in one transaction, stamping every row with `saved_at`.
  /// Rows sharing an id are replaced wholesale.
  fn store_batch(&self, documents: &[RawDocument], saved_at: i64) -> Result<()>;

  /// Every entry whose `saved_at` is greater than `cutoff`.
  fn entries_saved_after(&self, cutoff: i64) -> Result<Vec<CacheEntry>>;

  /// Remove every entry.
  fn clear(&self) -> Result<()>;

  /// Counts for all rows and for rows saved after `cutoff`.
  fn status(&self, cutoff: i64) -> Result<CacheStatus>;
}

/// Storage implementation that doesn't cache anything.
/// Used when persistent storage is unavailable or caching is disabled.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn initialize(&self) -> Result<()> {
    Ok(())
  }

  fn store_batch(&self, _documents: &[RawDocument], _saved_at: i64) -> Result<()> {
    Ok(()) // Discard
  }

  fn entries_saved_after(&self, _cutoff: i64) -> Result<Vec<CacheEntry>> {
    Ok(Vec::new()) // Always miss
  }

  fn clear(&self) -> Result<()> {
    Ok(())
  }

  fn status(&self, _cutoff: i64) -> Result<CacheStatus> {
    Ok(CacheStatus::default())
  }
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open (creating if needed) the cache database at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        Error::StorageUnavailable(format!(
          "failed to create cache directory {}: {}",
          parent.display(),
          e
        ))
      })?;
    }

    let conn = Connection::open(path).map_err(|e| {
      Error::StorageUnavailable(format!(
        "failed to open cache database at {}: {}",
        path.display(),
        e
      ))
    })?;

    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.initialize()?;
    debug!(path = %path.display(), "opened content cache");

    Ok(storage)
  }

  /// Open an in-memory database, mostly for tests.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| Error::StorageUnavailable(format!("failed to open in-memory cache: {}", e)))?;

    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.initialize()?;

    Ok(storage)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| Error::StorageUnavailable("could not determine data directory".into()))?;

    Ok(data_dir.join("filmixo").join("cache.db"))
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| Error::StorageUnavailable(format!("lock poisoned: {}", e)))
  }
}

/// Schema for the post cache. One row per document id; the `saved_at`
/// index serves the expiry cutoff scan.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    saved_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_posts_saved_at ON posts(saved_at);
"#;

impl CacheStorage for SqliteStorage {
  fn initialize(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| Error::StorageUnavailable(format!("failed to run cache migrations: {}", e)))
  }

  fn store_batch(&self, documents: &[RawDocument], saved_at: i64) -> Result<()> {
    let mut conn = self.lock()?;

    // Dropping the transaction without commit rolls everything back
    let tx = conn
      .transaction()
      .map_err(|e| Error::WriteFailed(format!("failed to begin transaction: {}", e)))?;

    {
      let mut stmt = tx
        .prepare("INSERT OR REPLACE INTO posts (id, payload, saved_at) VALUES (?1, ?2, ?3)")
        .map_err(|e| Error::WriteFailed(format!("failed to prepare insert: {}", e)))?;

      for doc in documents {
        let payload = serde_json::to_string(&doc.fields)
          .map_err(|e| Error::WriteFailed(format!("failed to serialize {}: {}", doc.id, e)))?;

        stmt
          .execute(params![doc.id, payload, saved_at])
          .map_err(|e| Error::WriteFailed(format!("failed to store {}: {}", doc.id, e)))?;
      }
    }

    tx.commit()
      .map_err(|e| Error::WriteFailed(format!("failed to commit transaction: {}", e)))?;

    debug!(count = documents.len(), saved_at, "stored cache batch");
    Ok(())
  }

  fn entries_saved_after(&self, cutoff: i64) -> Result<Vec<CacheEntry>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare("SELECT id, payload, saved_at FROM posts WHERE saved_at > ?1")
      .map_err(|e| Error::StorageUnavailable(format!("failed to prepare query: {}", e)))?;

    let rows: Vec<(String, String, i64)> = stmt
      .query_map(params![cutoff], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
      .and_then(|rows| rows.collect())
      .map_err(|e| Error::StorageUnavailable(format!("failed to read cache: {}", e)))?;

    let entries = rows
      .into_iter()
      .filter_map(|(id, payload, saved_at)| match serde_json::from_str(&payload) {
        Ok(fields) => Some(CacheEntry {
          document: RawDocument { id, fields },
          saved_at,
        }),
        Err(e) => {
          warn!(id = %id, error = %e, "skipping unreadable cache row");
          None
        }
      })
      .collect();

    Ok(entries)
  }

  fn clear(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute("DELETE FROM posts", [])
      .map_err(|e| Error::WriteFailed(format!("failed to clear cache: {}", e)))?;

    Ok(())
  }

  fn status(&self, cutoff: i64) -> Result<CacheStatus> {
    let conn = self.lock()?;

    let (total, valid, newest): (i64, i64, Option<i64>) = conn
      .query_row(
        "SELECT COUNT(*), COUNT(CASE WHEN saved_at > ?1 THEN 1 END), MAX(saved_at) FROM posts",
        params![cutoff],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
      )
      .map_err(|e| Error::StorageUnavailable(format!("failed to read cache status: {}", e)))?;

    Ok(CacheStatus {
      total: total as usize,
      valid: valid as usize,
      newest_saved_at: newest,
    })
  }
}
