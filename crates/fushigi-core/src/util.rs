//! Shared utility functions used across multiple modules.

use chrono::{DateTime, TimeZone, Utc};

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Case-insensitive substring match. `needle` must already be lowercase.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Convert a timestamp to unix milliseconds for storage.
pub fn to_unix_ms(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

/// Convert stored unix milliseconds back into a timestamp.
///
/// Out-of-range values collapse to the unix epoch.
pub fn from_unix_ms(value: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(value)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
