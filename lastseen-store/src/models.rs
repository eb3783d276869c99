use std::collections::{BTreeMap, HashMap};

use arrayvec::ArrayString;
use chrono::{DateTime, Utc};

/// Minecraft player name - max 16 characters, stored inline (no heap allocation).
pub type PlayerName = ArrayString<16>;

/// Minecraft name rules: 1-16 ASCII letters, digits or underscores.
pub fn is_valid_player_name(name: &str) -> bool {
  !name.is_empty()
    && name.len() <= 16
    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Discord user id in string form, exactly as it appears in the subscription file.
pub type SubscriberId = String;

/// Subscriber -> monitored player names, in the order they were added.
pub type Subscriptions = BTreeMap<SubscriberId, Vec<PlayerName>>;

/// Player name -> last known login instant.
/// A player missing from the map has an unknown login, not "never online".
pub type LoginMap = HashMap<PlayerName, DateTime<Utc>>;

/// Aggregate sizes of the subscription mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriptionCounts {
  /// Number of subscribers with at least one handle
  pub subscribers: usize,
  /// Number of distinct monitored handles across all subscribers
  pub handles: usize,
}

/// Metadata about the most recent cache swap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheInfo {
  /// Incremented on every swap, 0 before the first refresh
  pub generation: u64,
  /// When the current mapping was swapped in
  pub refreshed_at: Option<DateTime<Utc>>,
  /// Number of players with a known login
  pub entries: usize,
}
