//! Social share links for a post page.

use clap::ValueEnum;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left alone by JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
  .remove(b'-')
  .remove(b'_')
  .remove(b'.')
  .remove(b'!')
  .remove(b'~')
  .remove(b'*')
  .remove(b'\'')
  .remove(b'(')
  .remove(b')');

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SharePlatform {
  Facebook,
  Messenger,
  #[value(name = "whatsapp")]
  WhatsApp,
  Twitter,
  Telegram,
}

impl SharePlatform {
  pub const ALL: [SharePlatform; 5] = [
    SharePlatform::Facebook,
    SharePlatform::Messenger,
    SharePlatform::WhatsApp,
    SharePlatform::Twitter,
    SharePlatform::Telegram,
  ];

  pub fn label(&self) -> &'static str {
    match self {
      SharePlatform::Facebook => "Facebook",
      SharePlatform::Messenger => "Messenger",
      SharePlatform::WhatsApp => "WhatsApp",
      SharePlatform::Twitter => "Twitter",
      SharePlatform::Telegram => "Telegram",
    }
  }
}

fn encode(s: &str) -> String {
  utf8_percent_encode(s, COMPONENT).to_string()
}

/// Share link for `page_url` on `platform`. Text-based platforms get the
/// title and the link in one message.
pub fn share_url(platform: SharePlatform, title: &str, page_url: &str) -> String {
  let encoded_url = encode(page_url);
  let full_text = encode(&format!("{}\n\n{}", title, page_url));

  match platform {
    SharePlatform::Facebook => format!("https://www.facebook.com/sharer/sharer.php?u={}", encoded_url),
    SharePlatform::Messenger => format!("fb-messenger://share/?link={}", encoded_url),
    SharePlatform::WhatsApp => format!("https://wa.me/?text={}", full_text),
    SharePlatform::Twitter => format!("https://twitter.com/intent/tweet?text={}", full_text),
    SharePlatform::Telegram => format!(
      "https://t.me/share/url?url={}&text={}",
      encoded_url,
      encode(title)
    ),
  }
}

/// Share links for every platform, or just `only` when given.
pub fn share_links(
  only: Option<SharePlatform>,
  title: &str,
  page_url: &str,
) -> Vec<(SharePlatform, String)> {
  SharePlatform::ALL
    .into_iter()
    .filter(|p| only.map_or(true, |o| o == *p))
    .map(|p| (p, share_url(p, title, page_url)))
    .collect()
}

/// Canonical page URL of a post.
pub fn post_url(site_base: &str, id: &str) -> String {
  format!("{}/post.html?id={}", site_base.trim_end_matches('/'), encode(id))
}
