//! Per-visit state: the loaded feed, how far the reader has paged, and the
//! post they opened.

use tracing::{debug, info, warn};

use crate::cache::CacheSource;
use crate::firestore::cached_client::CachedPostsClient;
use crate::site::feed::{self, FeedCursor};
use crate::site::Post;

pub struct Session {
  client: CachedPostsClient,
  posts: Vec<Post>,
  cursor: FeedCursor,
  current: Option<Post>,
}

impl Session {
  pub fn new(client: CachedPostsClient, batch_size: usize) -> Self {
    Self {
      client,
      posts: Vec::new(),
      cursor: FeedCursor::new(batch_size),
      current: None,
    }
  }

  pub fn client(&self) -> &CachedPostsClient {
    &self.client
  }

  /// Load (or reload) the feed and rewind paging. Returns the number of posts.
  pub async fn load_feed(&mut self) -> usize {
    let result = self.client.list_posts().await;
    match result.source {
      CacheSource::Cache => debug!(count = result.data.len(), "feed served from cache"),
      CacheSource::Network => info!(count = result.data.len(), "feed fetched from remote"),
      CacheSource::Unavailable => warn!("feed unavailable, showing nothing"),
    }

    self.posts = result.data.iter().map(Post::from_document).collect();
    self.cursor.reset();
    self.posts.len()
  }

  /// The whole feed, newest first.
  pub fn posts(&self) -> &[Post] {
    &self.posts
  }

  /// Next page of the feed; empty once everything is shown.
  pub fn next_batch(&mut self) -> &[Post] {
    self.cursor.next_batch(&self.posts)
  }

  pub fn has_more(&self) -> bool {
    !self.cursor.is_exhausted(self.posts.len())
  }

  pub fn featured(&self) -> &[Post] {
    feed::featured(&self.posts)
  }

  /// A loaded post matching `key` by id or slug.
  pub fn find_loaded(&self, key: &str) -> Option<&Post> {
    self.posts.iter().find(|p| p.matches(key))
  }

  pub fn select_post(&mut self, post: Post) {
    debug!(id = %post.id, "post selected");
    self.current = Some(post);
  }

  /// The post behind `key`. The selected post is reused when it matches;
  /// anything else is a remote lookup by id.
  pub async fn fetch_post(&mut self, key: &str) -> Option<Post> {
    if let Some(post) = self.current.as_ref().filter(|p| p.matches(key)) {
      debug!(%key, "using selected post");
      return Some(post.clone());
    }

    match self.client.get_post(key).await {
      Ok(Some(doc)) => {
        let post = Post::from_document(&doc);
        self.current = Some(post.clone());
        Some(post)
      }
      Ok(None) => None,
      Err(e) => {
        warn!(%key, error = %e, "failed to fetch post");
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheLayer, RawDocument, SqliteStorage};
  use crate::config::PostsConfig;
  use crate::error::{Error, Result};
  use crate::firestore::api_types::Direction;
  use crate::firestore::client::DocumentStore;
  use async_trait::async_trait;
  use serde_json::json;
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use std::sync::Arc;

  struct StubStore {
    docs: Vec<RawDocument>,
    down: AtomicBool,
    get_calls: AtomicUsize,
  }

  #[async_trait]
  impl DocumentStore for StubStore {
    async fn list_collection(&self, _: &str, _: &str, _: Direction) -> Result<Vec<RawDocument>> {
      if self.down.load(Ordering::SeqCst) {
        return Err(Error::RemoteUnavailable("offline".into()));
      }
      Ok(self.docs.clone())
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<RawDocument> {
      self.get_calls.fetch_add(1, Ordering::SeqCst);
      if self.down.load(Ordering::SeqCst) {
        return Err(Error::RemoteUnavailable("offline".into()));
      }
      self
        .docs
        .iter()
        .find(|d| d.id == id)
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("{}/{}", collection, id)))
    }
  }

  fn doc(id: &str, title: &str, upload_time: i64) -> RawDocument {
    RawDocument::new(
      id,
      json!({ "title": title, "uploadTime": upload_time })
        .as_object()
        .cloned()
        .unwrap_or_default(),
    )
  }

  fn session_with(count: usize, batch_size: usize) -> (Session, Arc<StubStore>) {
    let docs = (0..count)
      .map(|i| doc(&format!("p{}", i), &format!("Movie {}", i), (count - i) as i64))
      .collect();
    let store = Arc::new(StubStore {
      docs,
      down: AtomicBool::new(false),
      get_calls: AtomicUsize::new(0),
    });
    let cache = CacheLayer::new(SqliteStorage::open_in_memory().unwrap());
    let client = CachedPostsClient::new(store.clone(), cache, &PostsConfig::default());
    (Session::new(client, batch_size), store)
  }

  fn ids(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|p| p.id.as_str()).collect()
  }

  #[tokio::test]
  async fn test_feed_pages_through_batches() {
    let (mut session, _) = session_with(25, 10);
    assert_eq!(session.load_feed().await, 25);

    assert_eq!(session.next_batch().len(), 10);
    assert_eq!(session.next_batch().len(), 10);
    assert!(session.has_more());
    assert_eq!(ids(session.next_batch()), vec!["p20", "p21", "p22", "p23", "p24"]);
    assert!(!session.has_more());
    assert!(session.next_batch().is_empty());
  }

  #[tokio::test]
  async fn test_reload_rewinds_paging() {
    let (mut session, _) = session_with(5, 2);
    session.load_feed().await;
    session.next_batch();
    session.load_feed().await;
    assert_eq!(ids(session.next_batch()), vec!["p0", "p1"]);
  }

  #[tokio::test]
  async fn test_featured_rail() {
    let (mut session, _) = session_with(15, 10);
    session.load_feed().await;
    let featured = session.featured();
    assert_eq!(featured.len(), 10);
    assert_eq!(featured[0].id, "p2");
    assert_eq!(featured[9].id, "p11");
  }

  #[tokio::test]
  async fn test_selected_post_is_reused_by_slug() {
    let (mut session, store) = session_with(3, 10);
    session.load_feed().await;
    let post = session.find_loaded("movie-1").cloned().unwrap();
    session.select_post(post);

    let fetched = session.fetch_post("movie-1").await.unwrap();
    assert_eq!(fetched.id, "p1");
    assert_eq!(store.get_calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_unselected_post_goes_remote() {
    let (mut session, store) = session_with(3, 10);

    let fetched = session.fetch_post("p2").await.unwrap();
    assert_eq!(fetched.title, "Movie 2");
    assert_eq!(store.get_calls.load(Ordering::SeqCst), 1);

    // Fetched post becomes the selection
    session.fetch_post("p2").await.unwrap();
    assert_eq!(store.get_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_missing_or_unreachable_post_is_none() {
    let (mut session, store) = session_with(1, 10);
    assert!(session.fetch_post("nope").await.is_none());

    store.down.store(true, Ordering::SeqCst);
    assert!(session.fetch_post("p0").await.is_none());
  }

  #[tokio::test]
  async fn test_unreachable_feed_is_empty() {
    let (mut session, store) = session_with(4, 10);
    store.down.store(true, Ordering::SeqCst);
    assert_eq!(session.load_feed().await, 0);
    assert!(session.featured().is_empty());
    assert!(session.next_batch().is_empty());
  }
}
