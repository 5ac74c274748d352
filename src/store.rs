//! Shared application state: the connectivity flag and the response cache.
//!
//! The store is an explicit container passed to the components that need it,
//! not a module-level global. Mutation goes through typed actions
//! (`set_online`, `cache_put`) and reads through selectors (`is_online`,
//! `cache_get`), so the cache and the connectivity flag are not writable from
//! arbitrary call sites.

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::{CacheEntry, CacheStore, MemoryStore};

/// Handle to the shared application state. Cloning is cheap; all clones
/// observe the same cache and connectivity flag.
#[derive(Clone)]
pub struct AppStore {
  inner: Arc<StoreInner>,
}

struct StoreInner {
  /// Current belief about network reachability. Optimistically true at
  /// process start; refreshed by the connectivity monitor. Last write wins.
  online: AtomicBool,
  cache: Box<dyn CacheStore>,
  /// When set, the cache is written here as a JSON blob after every store.
  persist_path: Option<PathBuf>,
}

impl AppStore {
  /// Create an in-memory store with no persistence.
  pub fn in_memory() -> Self {
    Self::with_storage(Box::new(MemoryStore::new()))
  }

  /// Create a store over an arbitrary cache backend, no persistence.
  pub fn with_storage(cache: Box<dyn CacheStore>) -> Self {
    Self {
      inner: Arc::new(StoreInner {
        online: AtomicBool::new(true),
        cache,
        persist_path: None,
      }),
    }
  }

  /// Open a store persisted at the default location, rehydrating any
  /// previously written blob.
  ///
  /// Expired entries are rehydrated as-is; TTL is evaluated at read time,
  /// so they are invalidated on the first read that observes them.
  pub fn open() -> Result<Self> {
    Self::open_at(Self::default_path()?)
  }

  /// Open a store persisted at the given path.
  pub fn open_at(path: PathBuf) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create store directory: {}", e))?;
    }

    let cache = MemoryStore::new();
    match Self::read_blob(&path) {
      Ok(Some(entries)) => {
        info!(entries = entries.len(), path = %path.display(), "rehydrated cache");
        cache.restore(entries);
      }
      Ok(None) => {}
      Err(e) => {
        // A corrupt blob is not fatal; start from an empty cache.
        warn!(path = %path.display(), error = %e, "discarding unreadable cache blob");
      }
    }

    Ok(Self {
      inner: Arc::new(StoreInner {
        online: AtomicBool::new(true),
        cache: Box::new(cache),
        persist_path: Some(path),
      }),
    })
  }

  /// Default blob location under the platform data directory.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("fetchkit").join("store.json"))
  }

  fn read_blob(path: &Path) -> Result<Option<HashMap<String, CacheEntry>>> {
    if !path.exists() {
      return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read store blob {}: {}", path.display(), e))?;
    let entries = serde_json::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse store blob {}: {}", path.display(), e))?;
    Ok(Some(entries))
  }

  /// Whether we currently believe the network is reachable.
  pub fn is_online(&self) -> bool {
    self.inner.online.load(Ordering::Relaxed)
  }

  /// Record the result of a reachability probe. Logs transitions only.
  pub fn set_online(&self, online: bool) {
    let was = self.inner.online.swap(online, Ordering::Relaxed);
    if was && !online {
      warn!("transitioning to offline mode");
    } else if !was && online {
      info!("back online");
    }
  }

  /// Read a cached value, enforcing the TTL invariant.
  ///
  /// An expired entry is treated as absent and removed here, on the read
  /// that observed its expiry.
  pub fn cache_get(&self, key: &str) -> Option<Value> {
    let entry = self.inner.cache.get(key)?;
    if entry.is_valid_at(Utc::now().timestamp_millis()) {
      Some(entry.value)
    } else {
      self.inner.cache.remove(key);
      None
    }
  }

  /// Store a value under a key with the given TTL, then persist the blob
  /// if this store is file-backed.
  pub fn cache_put(&self, key: &str, value: Value, ttl: Duration) {
    self.inner.cache.put(key, CacheEntry::new(value, ttl));
    self.persist();
  }

  /// Write the current cache contents to the blob path, if any. Persistence
  /// failures are logged and swallowed: losing the blob only costs a refetch.
  fn persist(&self) {
    let Some(path) = &self.inner.persist_path else {
      return;
    };

    let snapshot = self.inner.cache.snapshot();
    match serde_json::to_string(&snapshot) {
      Ok(blob) => {
        if let Err(e) = std::fs::write(path, blob) {
          warn!(path = %path.display(), error = %e, "failed to persist store");
        }
      }
      Err(e) => warn!(error = %e, "failed to serialize store"),
    }
  }
}
