//! Cache layer that orchestrates caching logic with network fetching.

use chrono::Duration;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::storage::CacheStorage;
use super::traits::{CacheResult, CacheStatus, Clock, RawDocument, SystemClock};
use crate::error::Result;

/// Default validity window for cached entries, in milliseconds.
pub const DEFAULT_EXPIRY_MS: i64 = 3_600_000;

/// Local content cache plus the cache-or-remote decision.
///
/// Expiry is lazy: stale rows stay in storage and are filtered out on read
/// until the next batch overwrites them or the cache is cleared.
pub struct CacheLayer {
  storage: Arc<dyn CacheStorage>,
  clock: Arc<dyn Clock>,
  /// How long a written entry stays eligible for reads
  expiry: Duration,
}

impl CacheLayer {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: impl CacheStorage + 'static) -> Self {
    Self {
      storage: Arc::new(storage),
      clock: Arc::new(SystemClock),
      expiry: Duration::milliseconds(DEFAULT_EXPIRY_MS),
    }
  }

  /// Set the validity window for cached data.
  pub fn with_expiry(mut self, expiry: Duration) -> Self {
    self.expiry = expiry;
    self
  }

  #[cfg(test)]
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// Entries saved at or before this instant are expired.
  fn cutoff(&self) -> i64 {
    self.clock.now_millis() - self.expiry.num_milliseconds()
  }

  /// Make sure the backing store exists. Repeat calls are no-ops.
  pub fn initialize(&self) -> Result<()> {
    self.storage.initialize()
  }

  /// Stamp the whole batch with one timestamp and write it atomically.
  pub fn save_all(&self, documents: &[RawDocument]) -> Result<()> {
    self.storage.store_batch(documents, self.clock.now_millis())
  }

  /// Every non-expired document, in no particular order.
  pub fn read_valid(&self) -> Result<Vec<RawDocument>> {
    let entries = self.storage.entries_saved_after(self.cutoff())?;
    Ok(entries.into_iter().map(|e| e.document).collect())
  }

  pub fn clear(&self) -> Result<()> {
    self.storage.clear()
  }

  pub fn status(&self) -> Result<CacheStatus> {
    self.storage.status(self.cutoff())
  }

  /// Fetch the full collection with a cache-first strategy.
  ///
  /// 1. Any valid cached entries are returned as-is; the fetcher is not called
  /// 2. Otherwise the fetcher runs and its result is written to the cache
  /// 3. A failed write is logged and the data is still returned
  /// 4. A failed fetch yields an empty list
  ///
  /// An empty cache read cannot be told apart from a remote collection that is
  /// legitimately empty, so zero posts always means another remote round-trip.
  pub async fn fetch_all<F, Fut>(&self, fetcher: F) -> CacheResult<Vec<RawDocument>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<RawDocument>>>,
  {
    match self.read_valid() {
      Ok(cached) if !cached.is_empty() => {
        debug!(count = cached.len(), "serving posts from cache");
        return CacheResult::from_cache(cached);
      }
      Ok(_) => debug!("cache miss"),
      Err(e) => warn!(error = %e, "cache read failed, treating as miss"),
    }

    match fetcher().await {
      Ok(data) => {
        info!(count = data.len(), "fetched posts from remote store");
        if let Err(e) = self.save_all(&data) {
          warn!(error = %e, "continuing without caching");
        }
        CacheResult::from_network(data)
      }
      Err(e) => {
        warn!(error = %e, "remote fetch failed");
        CacheResult::unavailable()
      }
    }
  }
}

impl Clone for CacheLayer {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      clock: Arc::clone(&self.clock),
      expiry: self.expiry,
    }
  }
}
