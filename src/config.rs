use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_EXPIRY_MS;
use crate::firestore::api_types::Direction;

const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub firestore: FirestoreConfig,
  #[serde(default)]
  pub posts: PostsConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub feed: FeedConfig,
  #[serde(default)]
  pub site: SiteConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreConfig {
  pub project_id: String,
  /// Web API key; FILMIXO_API_KEY takes precedence when set
  pub api_key: Option<String>,
  #[serde(default = "default_firestore_url")]
  pub base_url: String,
}

fn default_firestore_url() -> String {
  DEFAULT_FIRESTORE_URL.to_string()
}

/// Which collection holds the posts and how the feed is ordered.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostsConfig {
  pub collection: String,
  /// Business timestamp field the feed is sorted on
  pub order_by: String,
  /// Newest first unless overridden
  pub direction: Direction,
}

impl Default for PostsConfig {
  fn default() -> Self {
    Self {
      collection: "posts".to_string(),
      order_by: "uploadTime".to_string(),
      direction: Direction::Descending,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub enabled: bool,
  /// Validity window for cached posts
  pub expiry_ms: i64,
  /// Database location (defaults to $XDG_DATA_HOME/filmixo/cache.db)
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      expiry_ms: DEFAULT_EXPIRY_MS,
      path: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
  /// Posts shown per "load more" step
  pub batch_size: usize,
}

impl Default for FeedConfig {
  fn default() -> Self {
    Self { batch_size: 10 }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
  pub name: String,
  pub base_url: String,
  /// Image used when a post has none
  pub default_image: String,
}

impl Default for SiteConfig {
  fn default() -> Self {
    Self {
      name: "FILMIXO".to_string(),
      base_url: "https://filmixo.vercel.app".to_string(),
      default_image: "https://filmixo.vercel.app/thumbel/filmixo.jpeg".to_string(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./filmixo.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/filmixo/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/filmixo/config.yaml\n\
                 with at least `firestore.project_id` set."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("filmixo.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("filmixo").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;

    if config.firestore.project_id.trim().is_empty() {
      return Err(eyre!("firestore.project_id must not be empty"));
    }
    if config.cache.expiry_ms <= 0 {
      return Err(eyre!("cache.expiry_ms must be positive"));
    }

    Ok(config)
  }

  /// Get the Firestore API key.
  ///
  /// Checks FILMIXO_API_KEY first, then the config file.
  pub fn api_key(&self) -> Option<String> {
    std::env::var("FILMIXO_API_KEY")
      .ok()
      .filter(|k| !k.is_empty())
      .or_else(|| self.firestore.api_key.clone())
  }
}
