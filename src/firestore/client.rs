use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::cache::RawDocument;
use crate::config::FirestoreConfig;
use crate::error::{Error, Result};
use crate::firestore::api_types::{ApiDocument, ApiRunQueryRow, Direction, RunQueryRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Read-only access to a hosted document collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
  /// Every document in `collection`, ordered by `order_by`.
  async fn list_collection(
    &self,
    collection: &str,
    order_by: &str,
    direction: Direction,
  ) -> Result<Vec<RawDocument>>;

  /// One document by id. `Error::NotFound` when it does not exist.
  async fn get_by_id(&self, collection: &str, id: &str) -> Result<RawDocument>;
}

/// Firestore REST client
#[derive(Clone)]
pub struct FirestoreClient {
  http: reqwest::Client,
  /// `{base}/projects/{project}/databases/(default)/documents`
  documents_url: String,
  api_key: Option<String>,
}

impl FirestoreClient {
  /// `api_key` is resolved by the caller (see `Config::api_key`).
  pub fn new(config: &FirestoreConfig, api_key: Option<String>) -> Result<Self> {
    let documents_url = format!(
      "{}/projects/{}/databases/(default)/documents",
      config.base_url.trim_end_matches('/'),
      config.project_id
    );

    let http = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .user_agent(concat!("filmixo/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| Error::RemoteUnavailable(format!("failed to build HTTP client: {}", e)))?;

    Ok(Self {
      http,
      documents_url,
      api_key,
    })
  }

  /// Parse `raw` and attach the API key, if any.
  fn url(&self, raw: &str) -> Result<Url> {
    let mut url =
      Url::parse(raw).map_err(|e| Error::RemoteUnavailable(format!("bad URL {}: {}", raw, e)))?;
    if let Some(key) = &self.api_key {
      url.query_pairs_mut().append_pair("key", key);
    }
    Ok(url)
  }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
  async fn list_collection(
    &self,
    collection: &str,
    order_by: &str,
    direction: Direction,
  ) -> Result<Vec<RawDocument>> {
    let url = self.url(&format!("{}:runQuery", self.documents_url))?;
    debug!(collection, order_by, ?direction, "running collection query");

    let response = self
      .http
      .post(url)
      .json(&RunQueryRequest::ordered(collection, order_by, direction))
      .send()
      .await
      .map_err(|e| Error::RemoteUnavailable(format!("failed to query {}: {}", collection, e)))?;

    let status = response.status();
    if !status.is_success() {
      return Err(Error::RemoteUnavailable(format!(
        "query on {} returned {}",
        collection, status
      )));
    }

    let rows: Vec<ApiRunQueryRow> = response.json().await.map_err(|e| {
      Error::RemoteUnavailable(format!("failed to parse {} query: {}", collection, e))
    })?;

    Ok(
      rows
        .into_iter()
        .filter_map(|row| row.document)
        .map(ApiDocument::into_raw)
        .collect(),
    )
  }

  async fn get_by_id(&self, collection: &str, id: &str) -> Result<RawDocument> {
    let mut url = self.url(&self.documents_url)?;
    url
      .path_segments_mut()
      .map_err(|_| Error::RemoteUnavailable(format!("bad URL {}", self.documents_url)))?
      .push(collection)
      .push(id);
    debug!(collection, id, "fetching document");

    let response =
      self.http.get(url).send().await.map_err(|e| {
        Error::RemoteUnavailable(format!("failed to get {}/{}: {}", collection, id, e))
      })?;

    match response.status() {
      StatusCode::NOT_FOUND => Err(Error::NotFound(format!("{}/{}", collection, id))),
      status if !status.is_success() => Err(Error::RemoteUnavailable(format!(
        "get {}/{} returned {}",
        collection, id, status
      ))),
      _ => {
        let doc: ApiDocument = response.json().await.map_err(|e| {
          Error::RemoteUnavailable(format!("failed to parse {}/{}: {}", collection, id, e))
        })?;
        Ok(doc.into_raw())
      }
    }
  }
}
