//! SEO metadata for the home page and for single posts.
//!
//! Titles and descriptions rotate between a few phrasings; the caller passes
//! the RNG so output is reproducible under a fixed seed.

use serde::Serialize;
use serde_json::{json, Value};

use super::post::Post;
use super::time::iso8601;
use crate::config::SiteConfig;

const HOME_FALLBACK_TOPIC: &str = "Latest Global Cinema";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaKind {
  /// `<meta name="...">`
  Name,
  /// `<meta property="...">`
  Property,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaTag {
  pub kind: MetaKind,
  pub key: String,
  pub content: String,
}

impl MetaTag {
  fn name(key: &str, content: impl Into<String>) -> Self {
    Self {
      kind: MetaKind::Name,
      key: key.to_string(),
      content: content.into(),
    }
  }

  fn property(key: &str, content: impl Into<String>) -> Self {
    Self {
      kind: MetaKind::Property,
      key: key.to_string(),
      content: content.into(),
    }
  }
}

/// Everything a page head needs.
#[derive(Debug, Clone, Serialize)]
pub struct SeoMeta {
  pub title: String,
  pub description: String,
  pub canonical_url: String,
  pub tags: Vec<MetaTag>,
  /// JSON-LD document
  pub schema: Value,
}

#[cfg(test)]
impl SeoMeta {
  fn tag(&self, key: &str) -> Option<&str> {
    self
      .tags
      .iter()
      .find(|t| t.key == key)
      .map(|t| t.content.as_str())
  }
}

fn pick(rng: &mut fastrand::Rng, options: Vec<String>) -> String {
  let index = rng.usize(..options.len());
  options.into_iter().nth(index).unwrap_or_default()
}

/// Home page metadata built from the ordered feed.
pub fn home_meta(site: &SiteConfig, posts: &[Post], rng: &mut fastrand::Rng) -> SeoMeta {
  let name = &site.name;
  let base = site.base_url.trim_end_matches('/');
  let total = posts.len();
  let top = posts
    .iter()
    .take(3)
    .map(|p| p.title.as_str())
    .collect::<Vec<_>>()
    .join(", ");
  let top = if top.is_empty() {
    HOME_FALLBACK_TOPIC.to_string()
  } else {
    top
  };

  let title = pick(
    rng,
    vec![
      format!("{} | Analyzing the {} Ecosystem", name, top),
      format!("{} | Strategic Market Positioning: {}", name, top),
      format!("{} | Cinematic Forensics & Investigative Analysis: {}", name, top),
      format!("{} | Global Content Dynamics & Distribution: {}", name, top),
    ],
  );
  let description = pick(
    rng,
    vec![
      format!(
        "{}: a cinematic forensics hub decoding the market positioning of {}+ titles, including {}.",
        name, total, top
      ),
      format!(
        "Beyond mainstream critique: {} investigates {}+ films and the production dynamics behind {}.",
        name, total, top
      ),
      format!(
        "Professional cinematic analysis of {}+ trending titles, with a close look at {}.",
        total, top
      ),
    ],
  );

  let canonical_url = format!("{}/", base);
  let schema = json!({
    "@context": "https://schema.org",
    "@graph": [
      {
        "@type": "WebSite",
        "@id": format!("{}/#website", base),
        "url": base,
        "name": name,
        "description": description,
        "inLanguage": "en-US",
        "publisher": {
          "@type": "Organization",
          "name": name,
          "logo": { "@type": "ImageObject", "url": site.default_image }
        }
      },
      {
        "@type": "CollectionPage",
        "@id": format!("{}/#collection", base),
        "name": "Cinematic Analysis Archive",
        "mainEntity": {
          "@type": "ItemList",
          "numberOfItems": total,
          "itemListOrder": "https://schema.org/ItemListOrderDescending"
        }
      }
    ]
  });

  let tags = vec![
    MetaTag::name("description", description.clone()),
    MetaTag::name(
      "keywords",
      format!(
        "cinematic forensics, film analysis, {} reviews, production dynamics, {}",
        name.to_lowercase(),
        top
      ),
    ),
    MetaTag::property("og:title", title.clone()),
    MetaTag::property("og:description", description.clone()),
    MetaTag::property("og:url", canonical_url.clone()),
    MetaTag::name("twitter:title", title.clone()),
    MetaTag::name("twitter:description", description.clone()),
  ];

  SeoMeta {
    title,
    description,
    canonical_url,
    tags,
    schema,
  }
}

/// Metadata for one post page at `page_url`.
pub fn post_meta(site: &SiteConfig, post: &Post, page_url: &str, rng: &mut fastrand::Rng) -> SeoMeta {
  let name = &site.name;
  let movie = &post.title;
  let image = post
    .media_image
    .clone()
    .unwrap_or_else(|| site.default_image.clone());

  let title = pick(
    rng,
    vec![
      format!("{} | {} Professional Analysis", movie, name),
      format!("{} - Expert Review | {}", movie, name),
      format!("Watch {} | {} Cinematic Forensics", movie, name),
      format!("{} | Strategic Analysis & Full Review - {}", movie, name),
    ],
  );
  let description = pick(
    rng,
    vec![
      format!(
        "Comprehensive analysis of {}: expert review, technical breakdown, director insights and audience reactions.",
        movie
      ),
      format!(
        "{}: {} examines production quality, narrative structure and market positioning.",
        movie, name
      ),
      format!(
        "Unlock the vision behind {}. A critique covering direction, performances and cultural impact.",
        movie
      ),
    ],
  );

  let mut schema = json!({
    "@context": "https://schema.org",
    "@type": "Movie",
    "name": movie,
    "image": image,
    "description": description,
    "publisher": {
      "@type": "Organization",
      "name": name,
      "logo": { "@type": "ImageObject", "url": site.default_image }
    }
  });
  if let Some(published) = post.upload_time.and_then(iso8601) {
    schema["datePublished"] = Value::String(published);
  }

  let tags = vec![
    MetaTag::name("description", description.clone()),
    MetaTag::name(
      "keywords",
      format!(
        "{}, expert movie review, {} analysis, director insights, {} review",
        movie,
        name.to_lowercase(),
        movie
      ),
    ),
    MetaTag::name("author", format!("{} Editorial Team", name)),
    MetaTag::property("og:type", "video.movie"),
    MetaTag::property("og:site_name", name.clone()),
    MetaTag::property("og:title", title.clone()),
    MetaTag::property("og:description", description.clone()),
    MetaTag::property("og:url", page_url),
    MetaTag::property("og:image", image.clone()),
    MetaTag::name("twitter:card", "summary_large_image"),
    MetaTag::name("twitter:title", title.clone()),
    MetaTag::name("twitter:description", description.clone()),
    MetaTag::name("twitter:image", image),
  ];

  SeoMeta {
    title,
    description,
    canonical_url: page_url.to_string(),
    tags,
    schema,
  }
}
