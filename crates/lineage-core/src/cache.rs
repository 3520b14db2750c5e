//! Bounded in-memory portrait cache.
//!
//! Keys are image URLs; values are the raw downloaded bytes, costed by
//! their length. Both an entry-count limit and a cumulative byte-cost
//! limit are enforced synchronously on every insert, evicting in strict
//! least-recently-used order. `get` and `put` both refresh recency.

use std::{collections::HashMap, sync::Mutex};

use bytes::Bytes;

/// Capacity limits for an [`ImageCache`].
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
  /// Maximum number of resident entries.
  pub count_limit: usize,
  /// Maximum cumulative byte cost across all resident entries.
  pub total_cost_limit: usize,
}

impl Default for CacheConfig {
  /// 50 entries / 30 MiB, the limits the ancestry screen has always used.
  fn default() -> Self {
    Self {
      count_limit:      50,
      total_cost_limit: 30 * 1024 * 1024,
    }
  }
}

struct Entry {
  bytes:     Bytes,
  cost:      usize,
  last_used: u64,
}

struct Inner {
  entries:    HashMap<String, Entry>,
  total_cost: usize,
  tick:       u64,
}

impl Inner {
  /// Drop least-recently-used entries until both limits hold.
  fn evict(&mut self, config: &CacheConfig) {
    while self.entries.len() > config.count_limit
      || self.total_cost > config.total_cost_limit
    {
      let Some(oldest) = self
        .entries
        .iter()
        .min_by_key(|(_, entry)| entry.last_used)
        .map(|(url, _)| url.clone())
      else {
        return;
      };
      if let Some(entry) = self.entries.remove(&oldest) {
        self.total_cost -= entry.cost;
      }
    }
  }
}

/// Thread-safe URL → image-bytes cache with LRU eviction.
///
/// Shared behind an `Arc` across concurrent fetch completions; all access
/// goes through an interior mutex. Never fetches and never persists.
pub struct ImageCache {
  config: CacheConfig,
  inner:  Mutex<Inner>,
}

impl ImageCache {
  pub fn new(config: CacheConfig) -> Self {
    Self {
      config,
      inner: Mutex::new(Inner {
        entries:    HashMap::new(),
        total_cost: 0,
        tick:       0,
      }),
    }
  }

  /// Cached bytes for `url`, refreshing its recency.
  pub fn get(&self, url: &str) -> Option<Bytes> {
    let mut inner = self.inner.lock().expect("image cache lock poisoned");
    inner.tick += 1;
    let tick = inner.tick;
    let entry = inner.entries.get_mut(url)?;
    entry.last_used = tick;
    Some(entry.bytes.clone())
  }

  /// Insert or replace `url`, then evict until both limits hold.
  ///
  /// An entry whose cost alone exceeds the total cost limit is not
  /// admitted; it would only evict everything else and then fail anyway.
  pub fn put(&self, url: &str, bytes: Bytes) {
    let cost = bytes.len();
    if self.config.count_limit == 0 || cost > self.config.total_cost_limit {
      return;
    }
    let mut inner = self.inner.lock().expect("image cache lock poisoned");
    inner.tick += 1;
    let tick = inner.tick;
    let entry = Entry {
      bytes,
      cost,
      last_used: tick,
    };
    if let Some(old) = inner.entries.insert(url.to_string(), entry) {
      inner.total_cost -= old.cost;
    }
    inner.total_cost += cost;
    inner.evict(&self.config);
  }

  /// Number of resident entries.
  pub fn len(&self) -> usize {
    self.inner.lock().expect("image cache lock poisoned").entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Cumulative byte cost of all resident entries.
  pub fn total_cost(&self) -> usize {
    self.inner.lock().expect("image cache lock poisoned").total_cost
  }
}
