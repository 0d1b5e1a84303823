use chrono::{SecondsFormat, TimeZone, Utc};

/// Relative age of a timestamp, e.g. "3h ago".
///
/// Months are 30 days and years 365; anything under a minute (including
/// timestamps in the future) is "Just now".
pub fn time_ago(now_ms: i64, timestamp_ms: Option<i64>) -> String {
  let Some(ts) = timestamp_ms else {
    return "Recently".to_string();
  };

  let seconds = now_ms.saturating_sub(ts) / 1000;
  let minutes = seconds / 60;
  let hours = minutes / 60;
  let days = hours / 24;

  if seconds < 60 {
    "Just now".to_string()
  } else if minutes < 60 {
    format!("{}m ago", minutes)
  } else if hours < 24 {
    format!("{}h ago", hours)
  } else if days < 30 {
    format!("{}d ago", days)
  } else if days / 30 < 12 {
    format!("{}mo ago", days / 30)
  } else {
    format!("{}y ago", days / 365)
  }
}

/// ISO 8601 in UTC with milliseconds, the form schema.org dates use.
pub fn iso8601(timestamp_ms: i64) -> Option<String> {
  Utc
    .timestamp_millis_opt(timestamp_ms)
    .single()
    .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}
