//! Cache storage trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use super::entry::CacheEntry;

/// Trait for cache storage backends.
///
/// Backends store raw entries; TTL validation and lazy expiry live in the
/// [`crate::store::AppStore`] selectors so every backend gets the same policy.
pub trait CacheStore: Send + Sync {
  /// Get the raw entry for a key, expired or not.
  fn get(&self, key: &str) -> Option<CacheEntry>;

  /// Store or overwrite the entry for a key.
  fn put(&self, key: &str, entry: CacheEntry);

  /// Remove the entry for a key, if present.
  fn remove(&self, key: &str);

  /// Copy of the full contents, used for blob persistence.
  fn snapshot(&self) -> HashMap<String, CacheEntry>;

  /// Replace the full contents, used when rehydrating a persisted blob.
  fn restore(&self, entries: HashMap<String, CacheEntry>);
}

/// Storage that doesn't cache anything. Used when caching is disabled -
/// every read misses and every write is discarded.
pub struct NoopStore;

impl CacheStore for NoopStore {
  fn get(&self, _key: &str) -> Option<CacheEntry> {
    None
  }

  fn put(&self, _key: &str, _entry: CacheEntry) {}

  fn remove(&self, _key: &str) {}

  fn snapshot(&self) -> HashMap<String, CacheEntry> {
    HashMap::new()
  }

  fn restore(&self, _entries: HashMap<String, CacheEntry>) {}
}

/// In-memory cache storage backed by a mutex-guarded map.
///
/// Last write wins; there is no coordination between concurrent writers
/// beyond the map lock itself.
#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl CacheStore for MemoryStore {
  fn get(&self, key: &str) -> Option<CacheEntry> {
    self
      .entries
      .lock()
      .ok()
      .and_then(|map| map.get(key).cloned())
  }

  fn put(&self, key: &str, entry: CacheEntry) {
    if let Ok(mut map) = self.entries.lock() {
      map.insert(key.to_string(), entry);
    }
  }

  fn remove(&self, key: &str) {
    if let Ok(mut map) = self.entries.lock() {
      map.remove(key);
    }
  }

  fn snapshot(&self) -> HashMap<String, CacheEntry> {
    self
      .entries
      .lock()
      .map(|map| map.clone())
      .unwrap_or_default()
  }

  fn restore(&self, entries: HashMap<String, CacheEntry>) {
    if let Ok(mut map) = self.entries.lock() {
      *map = entries;
    }
  }
}
