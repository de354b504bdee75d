//! In-process change notification for cache writes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Emitted after a key has been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
  pub key: String,
}

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&CacheEvent)>;

/// Ordered list of listeners invoked synchronously on every notification.
///
/// Listeners may touch the notifier (or the cache that owns it) from inside
/// the callback: the list is not borrowed while a listener runs. Listeners
/// added during a notification are not called for it, and listeners removed
/// during a notification are skipped if they have not run yet.
#[derive(Default)]
pub struct ChangeNotifier {
  listeners: RefCell<Vec<(ListenerId, Listener)>>,
  next_id: Cell<u64>,
}

impl ChangeNotifier {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a listener. Listeners run in registration order.
  pub fn subscribe<F>(&self, listener: F) -> ListenerId
  where
    F: Fn(&CacheEvent) + 'static,
  {
    let id = ListenerId(self.next_id.get());
    self.next_id.set(id.0 + 1);
    self.listeners.borrow_mut().push((id, Rc::new(listener)));
    id
  }

  /// Remove a listener. Returns false if it was not registered.
  pub fn unsubscribe(&self, id: ListenerId) -> bool {
    let mut listeners = self.listeners.borrow_mut();
    let before = listeners.len();
    listeners.retain(|(registered, _)| *registered != id);
    listeners.len() != before
  }

  pub fn listener_count(&self) -> usize {
    self.listeners.borrow().len()
  }

  fn is_registered(&self, id: ListenerId) -> bool {
    self
      .listeners
      .borrow()
      .iter()
      .any(|(registered, _)| *registered == id)
  }

  /// Deliver `event` to every currently registered listener before returning.
  /// Returns how many listeners were called.
  pub fn notify(&self, event: &CacheEvent) -> usize {
    let snapshot: Vec<(ListenerId, Listener)> = self
      .listeners
      .borrow()
      .iter()
      .map(|(id, listener)| (*id, Rc::clone(listener)))
      .collect();

    debug!(key = %event.key, listeners = snapshot.len(), "cache updated");

    let mut delivered = 0;
    for (id, listener) in snapshot {
      if !self.is_registered(id) {
        continue;
      }
      listener(event);
      delivered += 1;
    }
    delivered
  }
}

impl fmt::Debug for ChangeNotifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ChangeNotifier")
      .field("listeners", &self.listener_count())
      .finish_non_exhaustive()
  }
}
