use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

pub fn now() -> DateTime<Utc> {
  Utc::now()
}

/// Convert a configured window into a chrono delta, saturating on overflow.
pub fn window(duration: Duration) -> TimeDelta {
  TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

/// `2025-01-31 18:04:09 UTC`
pub fn format_instant(at: DateTime<Utc>) -> String {
  at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Human readable age of a login, e.g. "3h 12m".
pub fn format_time_ago(elapsed: TimeDelta) -> String {
  let secs = elapsed.num_seconds().max(0);
  let (days, hours, minutes) = (secs / 86_400, (secs % 86_400) / 3_600, (secs % 3_600) / 60);
  if days > 0 {
    format!("{}d {}h", days, hours)
  } else if hours > 0 {
    format!("{}h {}m", hours, minutes)
  } else if minutes > 0 {
    format!("{}m", minutes)
  } else {
    "just now".to_string()
  }
}

/// Direct message sent when a monitored player logs in
pub fn format_notification(subscriber: &str, player: &str) -> String {
  format!("🔔 <@{}> **{}** just logged into Hypixel!", subscriber, player)
}
