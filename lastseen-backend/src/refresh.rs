use futures_util::future;
use futures_util::stream::{self, StreamExt};
use lastseen_store::{CacheInfo, LoginCache, LoginMap, SubscriptionStore};

use crate::helpers::now;
use crate::lookup::LoginLookup;

/// Result of a single refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed {
        /// Distinct players looked up
        queried: usize,
        /// State of the cache after the swap
        info: CacheInfo,
    },
    /// Another refresh was still in flight.
    Skipped,
}

/// Rebuild the login cache from scratch.
///
/// Each monitored player is looked up once, however many subscribers follow
/// it. Players without a known login are left out of the new mapping. The
/// swap happens only after every lookup of the cycle has finished.
pub async fn refresh_cache(
    subscriptions: &SubscriptionStore,
    cache: &LoginCache,
    lookup: &dyn LoginLookup,
    concurrency: usize,
) -> RefreshOutcome {
    let Some(guard) = cache.begin_refresh() else {
        tracing::debug!("login refresh already in flight, skipping");
        return RefreshOutcome::Skipped;
    };

    let players = subscriptions.distinct_handles().await;
    let queried = players.len();

    let logins: LoginMap = stream::iter(players)
        .map(|player| async move {
            lookup
                .last_login(player.as_str())
                .await
                .map(|at| (player, at))
        })
        .buffer_unordered(concurrency.max(1))
        .filter_map(future::ready)
        .collect()
        .await;

    let info = cache.replace(guard, logins, now()).await;
    tracing::info!(
        queried,
        found = info.entries,
        generation = info.generation,
        "login cache refreshed"
    );
    RefreshOutcome::Completed { queried, info }
}
