//! Cache entries with time-to-live expiry.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Default time-to-live for cached responses: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// A cached response payload keyed by request URL.
///
/// An entry is valid for reads iff `now - stored_at <= ttl`. Expired entries
/// are treated as absent and removed lazily on the read that observes them;
/// nothing sweeps the cache proactively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
  /// The JSON payload from the last successful fetch.
  pub value: Value,
  /// When the entry was stored, epoch milliseconds.
  pub stored_at_ms: i64,
  /// Milliseconds after which the entry is considered expired.
  pub ttl_ms: i64,
}

impl CacheEntry {
  /// Create an entry stamped with the current time.
  pub fn new(value: Value, ttl: Duration) -> Self {
    Self {
      value,
      stored_at_ms: Utc::now().timestamp_millis(),
      ttl_ms: ttl.as_millis() as i64,
    }
  }

  /// Whether the entry is still valid at the given epoch-millisecond instant.
  pub fn is_valid_at(&self, now_ms: i64) -> bool {
    now_ms - self.stored_at_ms <= self.ttl_ms
  }

  /// Whether the entry is still valid right now.
  pub fn is_valid(&self) -> bool {
    self.is_valid_at(Utc::now().timestamp_millis())
  }
}
