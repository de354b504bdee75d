//! Cache-first loading for views.

use chrono::Duration;
use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use tracing::{debug, warn};

use super::facade::DataCache;
use super::notifier::ListenerId;
use super::result::CacheResult;
use super::store::CacheValue;
use crate::query::{Query, QueryState};

/// A [`Query`] bound to one cache key.
///
/// 1. `load()` serves a fresh cached value without fetching; otherwise it
///    shows whatever the cache has and starts the fetch.
/// 2. A successful fetch is written through to the cache, which tells every
///    other view holding the same key.
/// 3. A failed fetch falls back to the cached value (offline mode). With
///    nothing cached, only the error is exposed.
/// 4. Writes to the key by anyone else are picked up on the next `poll()`.
///    A write that lands while a fetch is in flight wins over that fetch's
///    result, so local edits are not overwritten by older data.
pub struct CachedQuery<T> {
  key: String,
  cache: Rc<DataCache>,
  query: Query<T>,
  max_age: Option<Duration>,
  result: Option<CacheResult<Rc<T>>>,
  error: Option<String>,
  changed: Rc<Cell<bool>>,
  /// Set by any write to the key since the current fetch started
  written: Rc<Cell<bool>>,
  listener: ListenerId,
}

impl<T: Clone + Send + 'static> CachedQuery<T> {
  pub fn new<F, Fut>(cache: Rc<DataCache>, key: impl Into<String>, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let key = key.into();
    let changed = Rc::new(Cell::new(false));
    let written = Rc::new(Cell::new(false));

    let listener = {
      let changed = Rc::clone(&changed);
      let written = Rc::clone(&written);
      let watched = key.clone();
      cache.subscribe(move |event| {
        if event.key == watched {
          changed.set(true);
          written.set(true);
        }
      })
    };

    Self {
      key,
      cache,
      query: Query::new(fetcher),
      max_age: None,
      result: None,
      error: None,
      changed,
      written,
      listener,
    }
  }

  /// Judge freshness with `max_age` instead of the cache default.
  pub fn with_max_age(mut self, max_age: Duration) -> Self {
    self.max_age = Some(max_age);
    self
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  pub fn result(&self) -> Option<&CacheResult<Rc<T>>> {
    self.result.as_ref()
  }

  pub fn data(&self) -> Option<&T> {
    self.result.as_ref().map(|r| r.data.as_ref())
  }

  /// Message from the last failed fetch, cleared by the next success.
  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn is_loading(&self) -> bool {
    self.query.is_loading()
  }

  fn is_stale(&self) -> bool {
    match self.max_age {
      Some(max_age) => self.cache.is_stale_within(&self.key, max_age),
      None => self.cache.is_stale(&self.key),
    }
  }

  fn read_cache(&self) -> Option<Rc<T>> {
    match self.cache.get_as::<T>(&self.key) {
      Ok(value) => value,
      Err(e) => {
        warn!(key = %self.key, error = %e, "ignoring cached value of unexpected type");
        None
      }
    }
  }

  fn serve_from_cache(&mut self) -> bool {
    match self.read_cache() {
      Some(data) => {
        let stale = self.is_stale();
        let cached_at = self.cache.stored_at(&self.key);
        self.result = Some(CacheResult::from_cache(data, cached_at, stale));
        true
      }
      None => false,
    }
  }

  /// Serve fresh cached data, or start fetching.
  pub fn load(&mut self) {
    self.changed.set(false);

    if !self.is_stale() && self.serve_from_cache() {
      debug!(key = %self.key, "served from cache");
      return;
    }

    // Show stale data while the fetch runs
    self.serve_from_cache();
    if !self.query.is_loading() {
      self.written.set(false);
    }
    self.query.fetch();
  }

  /// Fetch again regardless of freshness.
  pub fn refresh(&mut self) {
    if self.changed.replace(false) {
      self.serve_from_cache();
    }
    self.written.set(false);
    self.query.refetch();
  }

  /// Pick up a finished fetch or a write by another view.
  ///
  /// Returns `true` if the served data or error changed.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;

    if self.query.poll() {
      changed = true;
      let outcome = match self.query.state() {
        QueryState::Success(data) => Some(Ok(data.clone())),
        QueryState::Error(e) => Some(Err(e.clone())),
        _ => None,
      };

      match outcome {
        Some(Ok(_)) if self.written.get() && self.cache.get(&self.key).is_some() => {
          debug!(key = %self.key, "cache written during fetch, keeping the newer value");
          self.error = None;
        }
        Some(Ok(data)) => {
          let data = Rc::new(data);
          self.error = None;
          self
            .cache
            .set_value(self.key.clone(), CacheValue::from_rc(Rc::clone(&data)));
          // Our own write needs no re-read
          self.changed.set(false);
          let cached_at = self.cache.stored_at(&self.key).unwrap_or_else(chrono::Utc::now);
          self.result = Some(CacheResult::from_network(data, cached_at));
        }
        Some(Err(e)) => {
          warn!(key = %self.key, error = %e, "fetch failed");
          self.error = Some(e);
          self.result = self.read_cache().map(|data| {
            let cached_at = self.cache.stored_at(&self.key);
            CacheResult::offline(data, cached_at)
          });
        }
        None => {}
      }
    }

    if self.changed.replace(false) && self.serve_from_cache() {
      debug!(key = %self.key, "picked up cache update");
      changed = true;
    }

    changed
  }
}

impl<T> Drop for CachedQuery<T> {
  fn drop(&mut self) {
    self.cache.unsubscribe(self.listener);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::clock::ManualClock;
  use crate::cache::result::CacheSource;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;

  const KEY: &str = "tasks:projects";

  fn counting_query(
    cache: &Rc<DataCache>,
    result: Result<Vec<String>, String>,
  ) -> (Arc<AtomicU32>, CachedQuery<Vec<String>>) {
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);
    let query = CachedQuery::new(Rc::clone(cache), KEY, move || {
      calls_clone.fetch_add(1, Ordering::SeqCst);
      let result = result.clone();
      async move { result }
    });
    (calls, query)
  }

  async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
  }

  fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  #[tokio::test]
  async fn test_fresh_cache_skips_fetch() {
    let cache = Rc::new(DataCache::with_clock(ManualClock::default()));
    cache.set(KEY, names(&["Website"]));

    let (calls, mut query) = counting_query(&cache, Ok(names(&["ignored"])));
    query.load();

    assert!(!query.is_loading());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let result = query.result().unwrap();
    assert_eq!(result.source, CacheSource::CacheFresh);
    assert_eq!(*result.data, names(&["Website"]));
  }

  #[tokio::test]
  async fn test_miss_fetches_and_writes_through() {
    let cache = Rc::new(DataCache::new());
    let notified = Rc::new(Cell::new(0));
    let notified_clone = Rc::clone(&notified);
    cache.subscribe(move |e| {
      if e.key == KEY {
        notified_clone.set(notified_clone.get() + 1);
      }
    });

    let (calls, mut query) = counting_query(&cache, Ok(names(&["Website", "Mobile"])));
    query.load();
    assert!(query.is_loading());
    assert!(query.data().is_none());

    settle().await;
    assert!(query.poll());

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(query.result().unwrap().source, CacheSource::Network);
    assert_eq!(notified.get(), 1);
    let cached = cache.get_as::<Vec<String>>(KEY).unwrap().unwrap();
    assert_eq!(*cached, names(&["Website", "Mobile"]));
    assert!(!cache.is_stale(KEY));
  }

  #[tokio::test]
  async fn test_stale_cache_is_shown_while_fetching() {
    let clock = Rc::new(ManualClock::default());
    let cache = Rc::new(DataCache::with_clock(Rc::clone(&clock)));
    cache.set(KEY, names(&["Old"]));
    clock.advance(Duration::minutes(6));

    let (calls, mut query) = counting_query(&cache, Ok(names(&["New"])));
    query.load();

    assert!(query.is_loading());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(query.result().unwrap().source, CacheSource::CacheStale);
    assert_eq!(query.data(), Some(&names(&["Old"])));

    settle().await;
    query.poll();
    assert_eq!(query.data(), Some(&names(&["New"])));
  }

  #[tokio::test]
  async fn test_failed_fetch_falls_back_to_cache() {
    let clock = Rc::new(ManualClock::default());
    let cache = Rc::new(DataCache::with_clock(Rc::clone(&clock)));
    cache.set(KEY, names(&["Old"]));
    clock.advance(Duration::minutes(10));

    let (_, mut query) = counting_query(&cache, Err("snapshot unreadable".to_string()));
    query.load();
    settle().await;
    assert!(query.poll());

    let result = query.result().unwrap();
    assert_eq!(result.source, CacheSource::Offline);
    assert_eq!(*result.data, names(&["Old"]));
    assert_eq!(query.error(), Some("snapshot unreadable"));
  }

  #[tokio::test]
  async fn test_failed_fetch_without_cache_reports_error() {
    let cache = Rc::new(DataCache::new());
    let (_, mut query) = counting_query(&cache, Err("boom".to_string()));
    query.load();
    settle().await;
    query.poll();

    assert!(query.result().is_none());
    assert_eq!(query.error(), Some("boom"));
  }

  #[tokio::test]
  async fn test_failed_refetch_after_invalidate_exposes_error() {
    let cache = Rc::new(DataCache::new());
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);
    let mut query = CachedQuery::new(Rc::clone(&cache), KEY, move || {
      let first = calls_clone.fetch_add(1, Ordering::SeqCst) == 0;
      async move {
        if first {
          Ok(names(&["Website"]))
        } else {
          Err("snapshot gone".to_string())
        }
      }
    });

    query.load();
    settle().await;
    query.poll();
    assert_eq!(query.result().unwrap().source, CacheSource::Network);

    cache.invalidate_all();
    query.refresh();
    settle().await;
    assert!(query.poll());

    assert!(query.result().is_none());
    assert!(query.data().is_none());
    assert_eq!(query.error(), Some("snapshot gone"));
  }

  #[tokio::test]
  async fn test_write_during_fetch_is_not_overwritten() {
    let cache = Rc::new(DataCache::new());
    let (_, mut query) = counting_query(&cache, Ok(names(&["From snapshot"])));
    query.load();
    assert!(query.is_loading());

    cache.set(KEY, names(&["Edited"]));
    // An intermediate tick picks the edit up before the fetch lands
    query.poll();
    assert_eq!(query.data(), Some(&names(&["Edited"])));

    settle().await;
    assert!(query.poll());

    assert_eq!(query.data(), Some(&names(&["Edited"])));
    let cached = cache.get_as::<Vec<String>>(KEY).unwrap().unwrap();
    assert_eq!(*cached, names(&["Edited"]));
    assert!(query.error().is_none());
  }

  #[tokio::test]
  async fn test_refresh_after_invalidate_writes_through() {
    let cache = Rc::new(DataCache::new());
    cache.set(KEY, names(&["Old"]));
    let (_, mut query) = counting_query(&cache, Ok(names(&["New"])));
    query.load();

    cache.invalidate_all();
    query.refresh();
    settle().await;
    query.poll();

    assert_eq!(query.result().unwrap().source, CacheSource::Network);
    let cached = cache.get_as::<Vec<String>>(KEY).unwrap().unwrap();
    assert_eq!(*cached, names(&["New"]));
  }

  #[tokio::test]
  async fn test_picks_up_writes_from_other_views() {
    let cache = Rc::new(DataCache::new());
    cache.set(KEY, names(&["A"]));

    let (_, mut query) = counting_query(&cache, Ok(Vec::new()));
    query.load();
    assert!(!query.poll());

    cache.set(KEY, names(&["A", "B"]));
    assert!(query.poll());
    assert_eq!(query.data(), Some(&names(&["A", "B"])));

    cache.set("tasks:data:other", 1u8);
    assert!(!query.poll());
  }

  #[tokio::test]
  async fn test_explicit_max_age() {
    let clock = Rc::new(ManualClock::default());
    let cache = Rc::new(DataCache::with_clock(Rc::clone(&clock)));
    cache.set(KEY, names(&["A"]));
    clock.advance(Duration::seconds(2));

    let (calls, query) = counting_query(&cache, Ok(names(&["B"])));
    let mut query = query.with_max_age(Duration::seconds(1));
    query.load();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_drop_unsubscribes() {
    let cache = Rc::new(DataCache::new());
    let (_, query) = counting_query(&cache, Ok(Vec::new()));
    assert_eq!(cache.listener_count(), 1);

    drop(query);
    assert_eq!(cache.listener_count(), 0);
  }
}
