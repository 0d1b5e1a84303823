//! Typed view of a post document.
//!
//! Documents in the collection were written by hand over several site
//! generations, so fields come and go and change names. All of that fallback
//! handling lives in [`Post::from_document`]; nothing downstream looks at the
//! raw map.

use serde_json::Value;

use crate::cache::RawDocument;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_EXCERPT: &str = "Discover this cinematic masterpiece...";

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
  pub id: String,
  pub title: String,
  pub media_image: Option<String>,
  /// Short teaser for cards
  pub excerpt: String,
  /// Full article text, possibly HTML
  pub body: String,
  pub category: Option<String>,
  /// Epoch milliseconds
  pub upload_time: Option<i64>,
}

impl Post {
  /// Resolve every field against its fallbacks. Never fails.
  pub fn from_document(doc: &RawDocument) -> Self {
    Self {
      id: doc.id.clone(),
      title: text_field(doc, &["title"]).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
      media_image: text_field(doc, &["mediaImage", "imageUrl", "image"]),
      excerpt: text_field(doc, &["excerpt", "description"])
        .unwrap_or_else(|| DEFAULT_EXCERPT.to_string()),
      body: text_field(doc, &["description", "content"]).unwrap_or_default(),
      category: text_field(doc, &["category"]),
      upload_time: millis_field(doc, &["uploadTime", "timestamp", "createdAt"]),
    }
  }

  /// Whether `key` names this post, either by id or by title slug.
  pub fn matches(&self, key: &str) -> bool {
    self.id == key || slugify(&self.title) == key
  }
}

/// First non-blank string among `keys`.
fn text_field(doc: &RawDocument, keys: &[&str]) -> Option<String> {
  keys.iter().find_map(|key| match doc.get(key) {
    Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
    _ => None,
  })
}

/// First usable timestamp among `keys`. Floats are truncated and numeric
/// strings parsed; values outside the `i64` range count as missing.
fn millis_field(doc: &RawDocument, keys: &[&str]) -> Option<i64> {
  keys.iter().find_map(|key| match doc.get(key)? {
    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_millis)),
    Value::String(s) => s.trim().parse::<f64>().ok().and_then(float_millis),
    _ => None,
  })
}

fn float_millis(f: f64) -> Option<i64> {
  // i64::MAX as f64 rounds up to 2^63, which is already out of range
  if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
    Some(f.trunc() as i64)
  } else {
    None
  }
}

/// URL slug for a title: lowercase ASCII alphanumerics joined by single dashes.
pub fn slugify(title: &str) -> String {
  let mut slug = String::with_capacity(title.len());
  let mut pending_dash = false;

  for c in title.chars().flat_map(char::to_lowercase) {
    if c.is_ascii_lowercase() || c.is_ascii_digit() {
      if pending_dash && !slug.is_empty() {
        slug.push('-');
      }
      pending_dash = false;
      slug.push(c);
    } else {
      pending_dash = true;
    }
  }

  slug
}
