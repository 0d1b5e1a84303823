//! Core types for the content cache.

use chrono::Utc;
use serde_json::{Map, Value};
#[cfg(test)]
use std::sync::atomic::{AtomicI64, Ordering};

/// One document as delivered by the remote store.
///
/// `fields` is opaque to the cache: it is stored and returned unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
  pub id: String,
  pub fields: Map<String, Value>,
}

impl RawDocument {
  pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
    Self {
      id: id.into(),
      fields,
    }
  }

  /// Look up a top-level field.
  pub fn get(&self, field: &str) -> Option<&Value> {
    self.fields.get(field)
  }
}

/// A stored document plus the time the cache wrote it.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
  pub document: RawDocument,
  /// Epoch milliseconds, set by the cache on every write
  pub saved_at: i64,
}

/// Snapshot of what the cache currently holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatus {
  pub total: usize,
  pub valid: usize,
  pub newest_saved_at: Option<i64>,
}

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
  /// Current time in epoch milliseconds.
  fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now_millis(&self) -> i64 {
    Utc::now().timestamp_millis()
  }
}

/// Clock that only moves when told to.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ManualClock {
  now: AtomicI64,
}

#[cfg(test)]
impl ManualClock {
  pub fn new(now_millis: i64) -> Self {
    Self {
      now: AtomicI64::new(now_millis),
    }
  }

  pub fn advance(&self, millis: i64) {
    self.now.fetch_add(millis, Ordering::SeqCst);
  }
}

#[cfg(test)]
impl Clock for ManualClock {
  fn now_millis(&self) -> i64 {
    self.now.load(Ordering::SeqCst)
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }

  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }
}

impl<T: Default> CacheResult<T> {
  /// Neither the cache nor the network produced anything.
  pub fn unavailable() -> Self {
    Self {
      data: T::default(),
      source: CacheSource::Unavailable,
    }
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Valid entries from the local cache
  Cache,
  /// Fresh batch from the remote store
  Network,
  /// Remote fetch failed and the cache had nothing valid
  Unavailable,
}
