//! Read-only views over a login cache snapshot, backing the Discord query commands.

use chrono::{DateTime, TimeDelta, Utc};
use lastseen_store::{LoginMap, PlayerName};

use crate::dispatcher::is_recent;

/// Players whose last login is inside `window`, newest first.
/// Considers every cached player, not only the caller's subscriptions.
pub fn recently_online(
    logins: &LoginMap,
    now: DateTime<Utc>,
    window: TimeDelta,
) -> Vec<(PlayerName, DateTime<Utc>)> {
    let mut recent: Vec<_> = logins
        .iter()
        .filter(|(_, at)| is_recent(**at, now, window))
        .map(|(player, at)| (*player, *at))
        .collect();
    recent.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    recent
}

/// Every cached login, ordered by player name.
pub fn all_last_logins(logins: &LoginMap) -> Vec<(PlayerName, DateTime<Utc>)> {
    let mut all: Vec<_> = logins.iter().map(|(player, at)| (*player, *at)).collect();
    all.sort_unstable();
    all
}

/// The player with the newest login, `None` when nothing is cached.
/// Ties go to the alphabetically first name.
pub fn most_recently_online(logins: &LoginMap) -> Option<(PlayerName, DateTime<Utc>)> {
    logins
        .iter()
        .map(|(player, at)| (*player, *at))
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
}
