//! In-memory query cache with a fixed time-to-live.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use crate::error::Result;

use super::clock::{Clock, SystemClock};
use super::traits::QueryKey;

/// A single cached payload.
struct CacheEntry {
  value: Value,
  stored_at: DateTime<Utc>,
}

/// Process-local cache for read queries.
///
/// Entries live only in memory and are served only while younger than the
/// TTL. Mutating operations remove the affected keys through
/// [`QueryCache::invalidate`], so a stale read is never served after a write
/// this client issued. Entries are a performance optimization, never a
/// source of truth: two in-flight reads may both miss and both fetch, and
/// the later write wins.
///
/// The lock around the map is held only for map access, never across an
/// await. A poisoned lock only means another thread panicked between map
/// operations; the map itself is still usable, so poisoning is ignored.
pub struct QueryCache {
  entries: Mutex<HashMap<String, CacheEntry>>,
  ttl: Duration,
  clock: Arc<dyn Clock>,
}

impl QueryCache {
  /// Cache with the default 5 minute TTL and the system clock.
  pub fn new() -> Self {
    Self::with_clock(Arc::new(SystemClock))
  }

  /// Cache with an injected time source.
  pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      ttl: Duration::minutes(5),
      clock,
    }
  }

  /// Override the TTL.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  fn is_fresh(&self, stored_at: DateTime<Utc>) -> bool {
    self.clock.now() - stored_at < self.ttl
  }

  /// Look up a fresh entry. An expired entry is treated as absent.
  pub fn get(&self, key: &dyn QueryKey) -> Option<Value> {
    let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    let entry = entries.get(&key.cache_hash())?;

    if self.is_fresh(entry.stored_at) {
      debug!(query = %key.description(), "cache hit");
      Some(entry.value.clone())
    } else {
      debug!(query = %key.description(), "cache entry expired");
      None
    }
  }

  /// Store a payload, replacing any previous entry for the key.
  pub fn put(&self, key: &dyn QueryKey, value: Value) {
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    entries.insert(
      key.cache_hash(),
      CacheEntry {
        value,
        stored_at: self.clock.now(),
      },
    );
  }

  /// Drop the entry for a key, if any.
  pub fn invalidate(&self, key: &dyn QueryKey) {
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    if entries.remove(&key.cache_hash()).is_some() {
      debug!(query = %key.description(), "cache invalidated");
    }
  }

  /// Cache-then-fetch.
  ///
  /// 1. Check cache - if fresh, return immediately
  /// 2. Otherwise run the fetcher
  /// 3. Store the result and return it; fetch errors propagate untouched
  pub async fn fetch<F, Fut>(&self, key: &dyn QueryKey, fetcher: F) -> Result<Value>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>>,
  {
    if let Some(hit) = self.get(key) {
      return Ok(hit);
    }

    let value = fetcher().await?;
    self.put(key, value.clone());
    Ok(value)
  }
}

impl Default for QueryCache {
  fn default() -> Self {
    Self::new()
  }
}
