//! Error types shared by the cache, the remote client and the session.
//!
//! The first three variants are handled locally by the fetch orchestrator and
//! never reach the rendering layer; `NotFound` is surfaced by single-document
//! lookups so the caller can tell "absent" apart from "unreachable".

/// Errors raised by the content cache and the remote document store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// Persistent storage could not be opened or read.
  #[error("storage unavailable: {0}")]
  StorageUnavailable(String),

  /// A cache write transaction aborted.
  #[error("cache write failed: {0}")]
  WriteFailed(String),

  /// The remote store could not be reached or returned garbage.
  #[error("remote store unavailable: {0}")]
  RemoteUnavailable(String),

  /// The requested document does not exist in the remote store.
  #[error("document not found: {0}")]
  NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
