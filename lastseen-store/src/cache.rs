//! In-memory login cache.
//!
//! The mapping is never edited in place: each refresh cycle builds a new one
//! and swaps it in whole, so readers always hold a single generation.
//! Login data is rebuilt from the upstream API, so durability isn't needed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{CacheInfo, LoginMap};

struct Generation {
  logins: Arc<LoginMap>,
  info: CacheInfo,
}

/// Process-wide player -> last login mapping.
pub struct LoginCache {
  current: RwLock<Generation>,
  refreshing: AtomicBool,
}

/// Held by the single refresh allowed to run at a time.
/// Dropping it (including on an early return) lets the next refresh start.
pub struct RefreshGuard<'a> {
  flag: &'a AtomicBool,
}

impl Drop for RefreshGuard<'_> {
  fn drop(&mut self) {
    self.flag.store(false, Ordering::Release);
  }
}

impl LoginCache {
  pub fn new() -> Self {
    Self {
      current: RwLock::new(Generation {
        logins: Arc::new(LoginMap::new()),
        info: CacheInfo::default(),
      }),
      refreshing: AtomicBool::new(false),
    }
  }

  /// Claim the refresh slot. Returns `None` while another refresh is in flight.
  pub fn begin_refresh(&self) -> Option<RefreshGuard<'_>> {
    self
      .refreshing
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| RefreshGuard {
        flag: &self.refreshing,
      })
  }

  pub fn is_refreshing(&self) -> bool {
    self.refreshing.load(Ordering::Acquire)
  }

  /// Swap in a freshly built mapping. Consumes the guard of the refresh that built it.
  pub async fn replace(
    &self,
    _guard: RefreshGuard<'_>,
    logins: LoginMap,
    now: DateTime<Utc>,
  ) -> CacheInfo {
    let mut current = self.current.write().await;
    let info = CacheInfo {
      generation: current.info.generation + 1,
      refreshed_at: Some(now),
      entries: logins.len(),
    };
    current.logins = Arc::new(logins);
    current.info = info;

    debug!(generation = info.generation, entries = info.entries, "login cache swapped");
    info
  }

  /// The current mapping. Later swaps do not affect a snapshot already taken.
  pub async fn snapshot(&self) -> Arc<LoginMap> {
    Arc::clone(&self.current.read().await.logins)
  }

  pub async fn info(&self) -> CacheInfo {
    self.current.read().await.info
  }
}

impl Default for LoginCache {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::PlayerName;
  use chrono::TimeZone;

  fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
  }

  fn name(s: &str) -> PlayerName {
    PlayerName::from(s).unwrap()
  }

  #[tokio::test]
  async fn test_replace_swaps_whole_mapping() {
    let cache = LoginCache::new();
    assert!(cache.snapshot().await.is_empty());
    assert_eq!(cache.info().await.generation, 0);

    let guard = cache.begin_refresh().unwrap();
    let first = LoginMap::from([(name("alice"), at(100)), (name("bob"), at(200))]);
    cache.replace(guard, first, at(1000)).await;

    let guard = cache.begin_refresh().unwrap();
    let second = LoginMap::from([(name("alice"), at(300))]);
    let info = cache.replace(guard, second, at(2000)).await;

    let snapshot = cache.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[&name("alice")], at(300));
    assert!(!snapshot.contains_key(&name("bob")));
    assert_eq!(info.generation, 2);
    assert_eq!(info.refreshed_at, Some(at(2000)));
    assert_eq!(info.entries, 1);
  }

  #[tokio::test]
  async fn test_snapshot_is_stable_across_swaps() {
    let cache = LoginCache::new();
    let guard = cache.begin_refresh().unwrap();
    cache
      .replace(guard, LoginMap::from([(name("alice"), at(100))]), at(1))
      .await;

    let held = cache.snapshot().await;

    let guard = cache.begin_refresh().unwrap();
    cache.replace(guard, LoginMap::new(), at(2)).await;

    assert_eq!(held.get(&name("alice")), Some(&at(100)));
    assert!(cache.snapshot().await.is_empty());
  }

  #[tokio::test]
  async fn test_overlapping_refresh_is_rejected() {
    let cache = LoginCache::new();

    let guard = cache.begin_refresh().unwrap();
    assert!(cache.is_refreshing());
    assert!(cache.begin_refresh().is_none());

    drop(guard);
    assert!(!cache.is_refreshing());
    assert!(cache.begin_refresh().is_some());
  }
}
