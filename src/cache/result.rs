//! What a cached load hands back to a view.

use chrono::{DateTime, Utc};

/// Data served to a view, with where it came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  pub data: T,
  pub source: CacheSource,
  /// When the data was written to the cache
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Data that was just fetched.
  pub fn from_network(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: Some(cached_at),
    }
  }

  /// Data read from the cache.
  pub fn from_cache(data: T, cached_at: Option<DateTime<Utc>>, is_stale: bool) -> Self {
    Self {
      data,
      source: if is_stale {
        CacheSource::CacheStale
      } else {
        CacheSource::CacheFresh
      },
      cached_at,
    }
  }

  /// Cached data served because the fetch failed.
  pub fn offline(data: T, cached_at: Option<DateTime<Utc>>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at,
    }
  }
}

/// Indicates where served data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched by this view
  Network,
  /// From the cache, within max age
  CacheFresh,
  /// From the cache, past max age (e.g. written by another view while a
  /// refresh is pending)
  CacheStale,
  /// Fetch failed, serving whatever the cache had
  Offline,
}

impl CacheSource {
  /// Short label for view titles.
  pub fn label(self) -> &'static str {
    match self {
      CacheSource::Network => "live",
      CacheSource::CacheFresh => "cached",
      CacheSource::CacheStale => "stale",
      CacheSource::Offline => "offline",
    }
  }
}
