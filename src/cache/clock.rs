//! Wall-clock sources for cache timestamps.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;

/// Source of the current time used to stamp and age cache entries.
pub trait Clock {
  fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// A clock that only moves when told to.
///
/// Useful for exercising staleness without sleeping.
#[derive(Debug, Clone)]
pub struct ManualClock {
  now: Cell<DateTime<Utc>>,
}

impl ManualClock {
  /// Start the clock at the given instant.
  pub fn new(start: DateTime<Utc>) -> Self {
    Self {
      now: Cell::new(start),
    }
  }

  /// Move the clock forward.
  pub fn advance(&self, by: Duration) {
    self.now.set(self.now.get() + by);
  }

  /// Jump to an absolute instant.
  pub fn set(&self, to: DateTime<Utc>) {
    self.now.set(to);
  }
}

impl Default for ManualClock {
  fn default() -> Self {
    Self::new(Utc::now())
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    self.now.get()
  }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
  fn now(&self) -> DateTime<Utc> {
    (**self).now()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_manual_clock_advances() {
    let start = Utc::now();
    let clock = ManualClock::new(start);
    assert_eq!(clock.now(), start);

    clock.advance(Duration::milliseconds(1500));
    assert_eq!(clock.now(), start + Duration::milliseconds(1500));
  }

  #[test]
  fn test_shared_manual_clock() {
    let clock = std::rc::Rc::new(ManualClock::default());
    let shared = std::rc::Rc::clone(&clock);
    let before = shared.now();

    clock.advance(Duration::seconds(10));
    assert_eq!(shared.now() - before, Duration::seconds(10));
  }
}
