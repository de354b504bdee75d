//! Read-time staleness judgment.

use chrono::{DateTime, Duration, Utc};

use super::store::CacheEntry;

/// Default maximum age in milliseconds before a cached value should be
/// refetched (5 minutes).
pub const DEFAULT_MAX_AGE_MS: i64 = 300_000;

pub fn default_max_age() -> Duration {
  Duration::milliseconds(DEFAULT_MAX_AGE_MS)
}

/// Decide whether an entry must be refetched.
///
/// A missing entry is always stale. Otherwise the entry is stale once it is
/// strictly older than `max_age`.
pub fn is_stale(entry: Option<&CacheEntry>, now: DateTime<Utc>, max_age: Duration) -> bool {
  match entry {
    Some(entry) => now - entry.stored_at > max_age,
    None => true,
  }
}
