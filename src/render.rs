//! Plain-text rendering of posts for the terminal.

use regex::Regex;
use std::sync::OnceLock;

use crate::site::time::time_ago;
use crate::site::Post;

const CARD_EXCERPT_LEN: usize = 120;

/// Truncate a string to at most `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

fn tag_pattern() -> &'static Regex {
  static TAG: OnceLock<Regex> = OnceLock::new();
  TAG.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"))
}

/// Drop HTML tags and collapse the whitespace left behind.
pub fn strip_tags(html: &str) -> String {
  let text = tag_pattern().replace_all(html, " ");
  text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One feed entry: title, age and a short teaser.
pub fn card(post: &Post, now_ms: i64) -> String {
  let category = post
    .category
    .as_deref()
    .map(|c| format!(" [{}]", c))
    .unwrap_or_default();
  format!(
    "{}{}  ({})\n  {}\n  id: {}",
    post.title,
    category,
    time_ago(now_ms, post.upload_time),
    truncate(&strip_tags(&post.excerpt), CARD_EXCERPT_LEN),
    post.id
  )
}

/// Footer under one feed page. `shown` counts only that page.
pub fn page_footer(page: usize, shown: usize, total: usize, has_more: bool) -> String {
  let more = if has_more { ", more available" } else { "" };
  format!("page {}: {} of {} posts{}", page, shown, total, more)
}

/// Full post view.
pub fn post_page(post: &Post, now_ms: i64) -> String {
  let mut out = format!("{}\n{}\n", post.title, time_ago(now_ms, post.upload_time));
  if let Some(image) = &post.media_image {
    out.push_str(&format!("image: {}\n", image));
  }
  out.push('\n');
  let body = strip_tags(&post.body);
  if body.is_empty() {
    out.push_str(&strip_tags(&post.excerpt));
  } else {
    out.push_str(&body);
  }
  out.push('\n');
  out
}
