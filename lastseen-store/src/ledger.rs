//! Record of which login each subscriber has already been told about.
//!
//! The login cache only changes once per refresh, while sweeps run far more
//! often, so the same login stays inside the notification window for many
//! sweeps. A pair is notified again only for a strictly newer login.

use chrono::{DateTime, Utc};

use crate::models::{PlayerName, SubscriberId};

/// Thread-safe (subscriber, player) -> last notified login instant.
/// Uses scc::HashMap for lock-free concurrent access.
pub struct NotificationLedger {
  notified: scc::HashMap<(SubscriberId, PlayerName), DateTime<Utc>>,
}

impl NotificationLedger {
  pub fn new() -> Self {
    Self {
      notified: scc::HashMap::new(),
    }
  }

  /// True if `subscriber` was already notified of this login or a later one.
  pub async fn already_notified(
    &self,
    subscriber: &str,
    player: PlayerName,
    login: DateTime<Utc>,
  ) -> bool {
    self
      .notified
      .read_async(&(subscriber.to_string(), player), |_, last| *last >= login)
      .await
      .unwrap_or(false)
  }

  /// Remember a delivered notification. Never moves an entry backwards.
  pub async fn record(&self, subscriber: &str, player: PlayerName, login: DateTime<Utc>) {
    let key = (subscriber.to_string(), player);
    let updated = self
      .notified
      .update_async(&key, |_, last| {
        if login > *last {
          *last = login;
        }
      })
      .await;

    if updated.is_none() {
      // single writer (the sweep), nothing else can insert this key in between
      let _ = self.notified.insert_async(key, login).await;
    }
  }

  /// Forget entries for logins older than `cutoff`.
  /// Such logins can no longer be inside the notification window.
  pub async fn prune_before(&self, cutoff: DateTime<Utc>) -> usize {
    let before = self.notified.len();
    self
      .notified
      .retain_async(|_, last| *last >= cutoff)
      .await;
    before.saturating_sub(self.notified.len())
  }

  pub fn len(&self) -> usize {
    self.notified.len()
  }

  pub fn is_empty(&self) -> bool {
    self.notified.is_empty()
  }
}

impl Default for NotificationLedger {
  fn default() -> Self {
    Self::new()
  }
}
