//! Local content cache with remote fallback.
//!
//! This module provides a source-agnostic caching mechanism that:
//! - Stores whole batches of documents atomically, keyed by document id
//! - Stamps every write with the time it happened
//! - Filters out expired entries on read instead of sweeping them
//! - Falls back to a caller-supplied fetcher when nothing valid is cached

mod layer;
mod storage;
mod traits;

pub use layer::{CacheLayer, DEFAULT_EXPIRY_MS};
pub use storage::{CacheStorage, NoopStorage, SqliteStorage};
pub use traits::{CacheResult, CacheSource, CacheStatus, RawDocument};
#[cfg(test)]
pub use traits::ManualClock;
