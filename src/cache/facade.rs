//! The data cache shared by every view.

use chrono::Duration;
use color_eyre::{eyre::eyre, Result};
use std::any::{type_name, Any};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::trace;

use super::clock::{Clock, SystemClock};
use super::notifier::{CacheEvent, ChangeNotifier, ListenerId};
use super::staleness::{self, default_max_age};
use super::store::{CacheStore, CacheValue};

/// Keyed, type-erased data cache with staleness checks and change
/// notification.
///
/// One instance lives for the whole session and is handed to views as
/// `Rc<DataCache>`. Every operation is synchronous and total. Keys are opaque:
/// callers pick keys that identify the resource (see [`crate::keys`]).
pub struct DataCache {
  store: RefCell<CacheStore>,
  notifier: ChangeNotifier,
  clock: Box<dyn Clock>,
  default_max_age: Duration,
}

impl DataCache {
  /// Create a cache on the system clock with the 5 minute default max age.
  pub fn new() -> Self {
    Self::with_clock(SystemClock)
  }

  /// Create a cache that reads time from `clock`.
  pub fn with_clock<C: Clock + 'static>(clock: C) -> Self {
    Self {
      store: RefCell::new(CacheStore::new()),
      notifier: ChangeNotifier::new(),
      clock: Box::new(clock),
      default_max_age: default_max_age(),
    }
  }

  /// Set the max age used by [`DataCache::is_stale`].
  pub fn with_default_max_age(mut self, max_age: Duration) -> Self {
    self.default_max_age = max_age;
    self
  }

  pub fn default_max_age(&self) -> Duration {
    self.default_max_age
  }

  /// The stored value for `key`, fresh or not.
  pub fn get(&self, key: &str) -> Option<CacheValue> {
    self.store.borrow().get(key).map(|entry| entry.value.clone())
  }

  /// The stored value for `key` as a `T`.
  ///
  /// `Ok(None)` when nothing is stored; an error when the stored value has a
  /// different type.
  pub fn get_as<T: Any>(&self, key: &str) -> Result<Option<Rc<T>>> {
    match self.get(key) {
      Some(value) => value
        .downcast::<T>()
        .map(Some)
        .map_err(|_| eyre!("Cache key '{}' does not hold a {}", key, type_name::<T>())),
      None => Ok(None),
    }
  }

  /// Store `value` under `key`, replacing any previous entry, then notify
  /// listeners.
  pub fn set<T: Any>(&self, key: impl Into<String>, value: T) {
    self.set_value(key, CacheValue::new(value));
  }

  /// Store an already type-erased value.
  pub fn set_value(&self, key: impl Into<String>, value: CacheValue) {
    let key = key.into();
    let now = self.clock.now();
    self.store.borrow_mut().insert(key.clone(), value, now);
    self.notifier.notify(&CacheEvent { key });
  }

  /// Drop the entry for `key`. Missing keys are ignored.
  pub fn invalidate(&self, key: &str) {
    if self.store.borrow_mut().remove(key) {
      trace!(key, "cache entry invalidated");
    }
  }

  /// Drop every entry.
  pub fn invalidate_all(&self) {
    let mut store = self.store.borrow_mut();
    trace!(entries = store.len(), "cache cleared");
    store.clear();
  }

  /// Whether `key` must be refetched under the default max age.
  pub fn is_stale(&self, key: &str) -> bool {
    self.is_stale_within(key, self.default_max_age)
  }

  /// Whether `key` must be refetched under an explicit max age.
  pub fn is_stale_within(&self, key: &str, max_age: Duration) -> bool {
    let store = self.store.borrow();
    staleness::is_stale(store.get(key), self.clock.now(), max_age)
  }

  /// When `key` was last written.
  pub fn stored_at(&self, key: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    self.store.borrow().get(key).map(|entry| entry.stored_at)
  }

  /// Register a listener called synchronously after every `set`.
  pub fn subscribe<F>(&self, listener: F) -> ListenerId
  where
    F: Fn(&CacheEvent) + 'static,
  {
    self.notifier.subscribe(listener)
  }

  pub fn unsubscribe(&self, id: ListenerId) -> bool {
    self.notifier.unsubscribe(id)
  }

  pub fn listener_count(&self) -> usize {
    self.notifier.listener_count()
  }

  pub fn len(&self) -> usize {
    self.store.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.store.borrow().is_empty()
  }
}

impl Default for DataCache {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for DataCache {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DataCache")
      .field("entries", &self.len())
      .field("notifier", &self.notifier)
      .field("default_max_age", &self.default_max_age)
      .finish_non_exhaustive()
  }
}
