mod cache;
mod config;
mod error;
mod firestore;
mod render;
mod session;
mod site;

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use cache::{CacheLayer, NoopStorage, SqliteStorage};
use config::Config;
use firestore::cached_client::CachedPostsClient;
use firestore::client::FirestoreClient;
use session::Session;
use site::seo;
use site::share::{self, SharePlatform};

const DEFAULT_LOG_FILTER: &str = "filmixo=info";

#[derive(Parser, Debug)]
#[command(name = "filmixo")]
#[command(about = "Cache-first reader for the FILMIXO movie post collection")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/filmixo/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Write logs to this file instead of stderr
  #[arg(long)]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the featured rail and one page of the feed
  Feed {
    /// Zero-based page to show
    #[arg(short, long, default_value_t = 0)]
    batch: usize,
  },
  /// Show a single post by id or title slug
  Post {
    id: String,
    /// Also print the page's SEO metadata as JSON
    #[arg(long)]
    seo: bool,
    /// Also print share links
    #[arg(long)]
    share: bool,
    /// Only print the share link for this platform
    #[arg(long, value_enum, requires = "share")]
    platform: Option<SharePlatform>,
  },
  /// Print the home page SEO metadata as JSON
  HomeSeo,
  /// Inspect or reset the local post cache
  Cache {
    #[command(subcommand)]
    action: CacheAction,
  },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
  Status,
  Clear,
}

/// Install the global subscriber. The returned guard flushes the file
/// writer on drop and must outlive `main`'s work.
fn init_tracing(log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

  match log_file {
    Some(path) => {
      let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
      let name = path
        .file_name()
        .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;
      let appender = tracing_appender::rolling::never(dir, name);
      let (writer, guard) = tracing_appender::non_blocking(appender);
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
      Ok(Some(guard))
    }
    None => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
      Ok(None)
    }
  }
}

/// Open the configured cache, or a pass-through one when disabled or when
/// the database cannot be opened.
fn open_cache(config: &Config) -> CacheLayer {
  let expiry = Duration::milliseconds(config.cache.expiry_ms);
  if !config.cache.enabled {
    return CacheLayer::new(NoopStorage).with_expiry(expiry);
  }

  let opened = match &config.cache.path {
    Some(path) => SqliteStorage::open(path),
    None => SqliteStorage::default_path().and_then(|p| SqliteStorage::open(&p)),
  };

  let layer = match opened {
    Ok(storage) => CacheLayer::new(storage),
    Err(e) => {
      warn!(error = %e, "cache unavailable, every load will hit the remote store");
      CacheLayer::new(NoopStorage)
    }
  };
  layer.with_expiry(expiry)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_tracing(args.log_file.as_ref())?;

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  let cache = open_cache(&config);
  if let Err(e) = cache.initialize() {
    warn!(error = %e, "cache initialization failed");
  }
  let store = Arc::new(FirestoreClient::new(&config.firestore, config.api_key())?);
  let client = CachedPostsClient::new(store, cache, &config.posts);
  let mut session = Session::new(client, config.feed.batch_size);

  let now = Utc::now().timestamp_millis();

  match args.command {
    Command::Feed { batch } => {
      let total = session.load_feed().await;
      if total == 0 {
        println!("No posts available.");
        return Ok(());
      }

      let featured = session.featured();
      if !featured.is_empty() {
        println!("== Featured ==");
        for post in featured {
          println!("{}\n", render::card(post, now));
        }
      }

      // Walk the cursor up to the requested page
      let mut page = session.next_batch().to_vec();
      for _ in 0..batch {
        page = session.next_batch().to_vec();
      }

      println!("== Latest (page {}) ==", batch);
      if page.is_empty() {
        println!("Nothing more to show.");
      }
      for post in &page {
        println!("{}\n", render::card(post, now));
      }
      println!(
        "{}",
        render::page_footer(batch, page.len(), total, session.has_more())
      );
    }

    Command::Post {
      id,
      seo: show_seo,
      share: show_share,
      platform,
    } => {
      // Reuse the feed entry when the key names a loaded post
      session.load_feed().await;
      if let Some(post) = session.find_loaded(&id).cloned() {
        session.select_post(post);
      }

      let Some(post) = session.fetch_post(&id).await else {
        return Err(eyre!("Post not found: {}", id));
      };

      print!("{}", render::post_page(&post, now));

      let page_url = share::post_url(&config.site.base_url, &post.id);
      if show_seo {
        let meta = seo::post_meta(&config.site, &post, &page_url, &mut fastrand::Rng::new());
        println!("\n{}", serde_json::to_string_pretty(&meta)?);
      }
      if show_share {
        println!();
        for (platform, link) in share::share_links(platform, &post.title, &page_url) {
          println!("{:<10} {}", platform.label(), link);
        }
      }
    }

    Command::HomeSeo => {
      session.load_feed().await;
      let meta = seo::home_meta(&config.site, session.posts(), &mut fastrand::Rng::new());
      println!("{}", serde_json::to_string_pretty(&meta)?);
    }

    Command::Cache { action } => match action {
      CacheAction::Status => {
        let status = session.client().cache_status()?;
        println!("entries: {} ({} valid)", status.total, status.valid);
        match status.newest_saved_at {
          Some(ts) => println!("last saved: {}", site::time::time_ago(now, Some(ts))),
          None => println!("last saved: never"),
        }
      }
      CacheAction::Clear => {
        session.client().clear_cache()?;
        println!("Cache cleared.");
      }
    },
  }

  Ok(())
}
