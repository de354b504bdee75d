//! Keyed entry storage.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A type-erased cached value.
///
/// Cloning is cheap and yields a handle to the same underlying value.
#[derive(Clone)]
pub struct CacheValue(Rc<dyn Any>);

impl CacheValue {
  pub fn new<T: Any>(value: T) -> Self {
    Self(Rc::new(value))
  }

  /// Wrap an already shared value without copying it.
  pub fn from_rc<T: Any>(value: Rc<T>) -> Self {
    Self(value)
  }

  /// Check whether the stored value is a `T`.
  pub fn is<T: Any>(&self) -> bool {
    self.0.is::<T>()
  }

  /// Borrow the value as a `T`, if that is what it holds.
  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    self.0.downcast_ref::<T>()
  }

  /// Recover the shared `T`, failing if the value holds another type.
  pub fn downcast<T: Any>(&self) -> Result<Rc<T>> {
    Rc::clone(&self.0)
      .downcast::<T>()
      .map_err(|_| eyre!("Cached value is not a {}", type_name::<T>()))
  }

  /// Whether two handles point at the same stored value.
  pub fn ptr_eq(&self, other: &CacheValue) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }
}

impl fmt::Debug for CacheValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("CacheValue(..)")
  }
}

/// A stored value and the instant it was written.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  pub value: CacheValue,
  pub stored_at: DateTime<Utc>,
}

/// Map from caller-chosen keys to entries. At most one entry per key.
#[derive(Debug, Default)]
pub struct CacheStore {
  entries: HashMap<String, CacheEntry>,
}

impl CacheStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &str) -> Option<&CacheEntry> {
    self.entries.get(key)
  }

  /// Insert or fully replace the entry for `key`.
  pub fn insert(&mut self, key: String, value: CacheValue, now: DateTime<Utc>) {
    self.entries.insert(
      key,
      CacheEntry {
        value,
        stored_at: now,
      },
    );
  }

  /// Remove the entry for `key`. Returns whether one existed.
  pub fn remove(&mut self, key: &str) -> bool {
    self.entries.remove(key).is_some()
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.entries.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
