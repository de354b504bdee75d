//! Shared in-memory data cache.
//!
//! This module provides the session-wide cache that views use to avoid
//! reloading the same organization, project and task lists:
//! - Stores any value under a caller-chosen string key, with the time it was written
//! - Judges staleness at read time against a max age (5 minutes by default)
//! - Tells registered listeners, synchronously, about every write
//! - Provides cache-first loading for views (`CachedQuery`)
//!
//! Nothing is persisted and nothing expires on its own.

mod clock;
mod facade;
mod layer;
mod notifier;
mod result;
mod staleness;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use facade::DataCache;
pub use layer::CachedQuery;
pub use notifier::{CacheEvent, ChangeNotifier, ListenerId};
pub use result::{CacheResult, CacheSource};
pub use staleness::{default_max_age, is_stale, DEFAULT_MAX_AGE_MS};
pub use store::{CacheEntry, CacheStore, CacheValue};
