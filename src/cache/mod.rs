//! TTL-based response caching for offline support.
//!
//! This module provides the storage half of the offline story:
//! - Entries are keyed by request URL and carry an epoch-millisecond
//!   timestamp plus a time-to-live (default one hour)
//! - An entry past its TTL is treated as absent and cleared lazily on the
//!   read that observes it; nothing sweeps the cache in the background
//! - Storage backends are pluggable behind the [`CacheStore`] trait

mod entry;
mod storage;

pub use entry::{CacheEntry, DEFAULT_TTL};
pub use storage::{CacheStore, MemoryStore, NoopStore};
