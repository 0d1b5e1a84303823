//! Posts client that wraps a document store with transparent caching.

use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::{CacheLayer, CacheResult, CacheStatus, RawDocument};
use crate::config::PostsConfig;
use crate::error::{Error, Result};

use super::api_types::Direction;
use super::client::DocumentStore;

/// Document store with transparent caching support.
///
/// The collection listing is cache-first; single lookups always go to the
/// remote store.
#[derive(Clone)]
pub struct CachedPostsClient {
  inner: Arc<dyn DocumentStore>,
  cache: CacheLayer,
  collection: String,
  order_by: String,
  direction: Direction,
}

impl CachedPostsClient {
  pub fn new(inner: Arc<dyn DocumentStore>, cache: CacheLayer, posts: &PostsConfig) -> Self {
    Self {
      inner,
      cache,
      collection: posts.collection.clone(),
      order_by: posts.order_by.clone(),
      direction: posts.direction,
    }
  }

  /// All posts in feed order (newest first by default).
  pub async fn list_posts(&self) -> CacheResult<Vec<RawDocument>> {
    let mut result = self
      .cache
      .fetch_all(|| {
        self
          .inner
          .list_collection(&self.collection, &self.order_by, self.direction)
      })
      .await;

    // Cached rows come back in storage order
    sort_feed(&mut result.data, &self.order_by, self.direction);
    result
  }

  /// Get a single post by id (not cached - the feed cache is batch-only).
  pub async fn get_post(&self, id: &str) -> Result<Option<RawDocument>> {
    match self.inner.get_by_id(&self.collection, id).await {
      Ok(doc) => Ok(Some(doc)),
      Err(Error::NotFound(what)) => {
        info!(%what, "post not found");
        Ok(None)
      }
      Err(e) => Err(e),
    }
  }

  pub fn clear_cache(&self) -> Result<()> {
    debug!("clearing post cache");
    self.cache.clear()
  }

  pub fn cache_status(&self) -> Result<CacheStatus> {
    self.cache.status()
  }
}

/// Numeric sort key; numeric strings count, anything else is missing.
fn order_key(doc: &RawDocument, field: &str) -> Option<f64> {
  match doc.get(field)? {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.parse().ok(),
    _ => None,
  }
}

/// Stable sort on `field` in `direction`, documents without it last.
fn sort_feed(docs: &mut [RawDocument], field: &str, direction: Direction) {
  docs.sort_by(|a, b| match (order_key(a, field), order_key(b, field)) {
    (Some(x), Some(y)) => match direction {
      Direction::Ascending => x.total_cmp(&y),
      Direction::Descending => y.total_cmp(&x),
    },
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  });
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, SqliteStorage};
  use async_trait::async_trait;
  use serde_json::json;
  use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

  /// In-memory store that counts calls.
  struct StubStore {
    docs: Vec<RawDocument>,
    fail: bool,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
  }

  impl StubStore {
    fn with(docs: Vec<RawDocument>) -> Arc<Self> {
      Arc::new(Self {
        docs,
        fail: false,
        list_calls: AtomicUsize::new(0),
        get_calls: AtomicUsize::new(0),
      })
    }

    fn failing() -> Arc<Self> {
      Arc::new(Self {
        docs: Vec::new(),
        fail: true,
        list_calls: AtomicUsize::new(0),
        get_calls: AtomicUsize::new(0),
      })
    }
  }

  #[async_trait]
  impl DocumentStore for StubStore {
    async fn list_collection(
      &self,
      _collection: &str,
      _order_by: &str,
      _direction: Direction,
    ) -> Result<Vec<RawDocument>> {
      self.list_calls.fetch_add(1, AtomicOrdering::SeqCst);
      if self.fail {
        return Err(Error::RemoteUnavailable("connection refused".into()));
      }
      Ok(self.docs.clone())
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<RawDocument> {
      self.get_calls.fetch_add(1, AtomicOrdering::SeqCst);
      if self.fail {
        return Err(Error::RemoteUnavailable("connection refused".into()));
      }
      self
        .docs
        .iter()
        .find(|d| d.id == id)
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("{}/{}", collection, id)))
    }
  }

  fn post(id: &str, upload_time: i64) -> RawDocument {
    RawDocument::new(
      id,
      json!({ "title": id.to_uppercase(), "uploadTime": upload_time })
        .as_object()
        .cloned()
        .unwrap_or_default(),
    )
  }

  fn client(store: Arc<StubStore>) -> CachedPostsClient {
    let cache = CacheLayer::new(SqliteStorage::open_in_memory().unwrap());
    CachedPostsClient::new(store, cache, &PostsConfig::default())
  }

  #[tokio::test]
  async fn test_second_listing_is_served_from_cache() {
    let store = StubStore::with(vec![post("c", 3), post("b", 2), post("a", 1)]);
    let client = client(store.clone());

    let first = client.list_posts().await;
    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(first.data.len(), 3);

    let second = client.list_posts().await;
    assert_eq!(second.source, CacheSource::Cache);
    assert_eq!(second.data, first.data);
    assert_eq!(store.list_calls.load(AtomicOrdering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_remote_failure_returns_nothing_and_caches_nothing() {
    let store = StubStore::failing();
    let client = client(store.clone());

    let result = client.list_posts().await;

    assert!(result.data.is_empty());
    assert_eq!(result.source, CacheSource::Unavailable);
    assert_eq!(client.cache_status().unwrap().total, 0);
  }

  #[tokio::test]
  async fn test_cached_posts_are_sorted_newest_first() {
    let store = StubStore::with(vec![post("old", 1), post("new", 30), post("mid", 20)]);
    let client = client(store);

    let ids: Vec<String> = client
      .list_posts()
      .await
      .data
      .into_iter()
      .map(|d| d.id)
      .collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
  }

  #[tokio::test]
  async fn test_get_post_goes_remote_every_time() {
    let store = StubStore::with(vec![post("dune", 1)]);
    let client = client(store.clone());

    assert!(client.get_post("dune").await.unwrap().is_some());
    assert!(client.get_post("dune").await.unwrap().is_some());
    assert!(client.get_post("missing").await.unwrap().is_none());
    assert_eq!(store.get_calls.load(AtomicOrdering::SeqCst), 3);
  }

  #[tokio::test]
  async fn test_get_post_surfaces_remote_errors() {
    let client = client(StubStore::failing());
    assert!(matches!(
      client.get_post("dune").await,
      Err(Error::RemoteUnavailable(_))
    ));
  }

  #[tokio::test]
  async fn test_clear_cache_forces_refetch() {
    let store = StubStore::with(vec![post("a", 1)]);
    let client = client(store.clone());

    client.list_posts().await;
    client.clear_cache().unwrap();
    client.list_posts().await;

    assert_eq!(store.list_calls.load(AtomicOrdering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_ascending_feed_is_oldest_first() {
    let store = StubStore::with(vec![post("mid", 20), post("old", 1), post("new", 30)]);
    let cache = CacheLayer::new(SqliteStorage::open_in_memory().unwrap());
    let posts = PostsConfig {
      direction: Direction::Ascending,
      ..PostsConfig::default()
    };
    let client = CachedPostsClient::new(store, cache, &posts);

    let ids: Vec<String> = client
      .list_posts()
      .await
      .data
      .into_iter()
      .map(|d| d.id)
      .collect();
    assert_eq!(ids, vec!["old", "mid", "new"]);
  }

  #[test]
  fn test_sort_puts_missing_field_last() {
    let mut docs = vec![
      RawDocument::new("none", Default::default()),
      post("one", 1),
      RawDocument::new(
        "text",
        json!({ "uploadTime": "5" }).as_object().cloned().unwrap_or_default(),
      ),
    ];

    sort_feed(&mut docs, "uploadTime", Direction::Descending);

    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["text", "one", "none"]);
  }
}
