//! Notification sweep: turn fresh logins in the cache into direct messages.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use lastseen_store::{LoginCache, NotificationLedger, PlayerName, SubscriptionStore};

use crate::error::NotifyError;

/// Outbound channel for login notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message to `subscriber` saying that `player` logged in.
    async fn notify(&self, subscriber: &str, player: &str) -> Result<(), NotifyError>;
}

/// Counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Players whose login is inside the window
    pub recent: usize,
    pub delivered: usize,
    /// Pairs skipped because this login was already announced
    pub suppressed: usize,
    pub failed: usize,
}

/// True if a login at `last_login` is still inside `window` at `now`.
pub fn is_recent(last_login: DateTime<Utc>, now: DateTime<Utc>, window: TimeDelta) -> bool {
    match now.checked_sub_signed(window) {
        Some(cutoff) => last_login >= cutoff,
        None => true,
    }
}

pub struct NotificationDispatcher {
    subscriptions: Arc<SubscriptionStore>,
    cache: Arc<LoginCache>,
    notifier: Arc<dyn Notifier>,
    ledger: NotificationLedger,
    window: TimeDelta,
}

impl NotificationDispatcher {
    pub fn new(
        subscriptions: Arc<SubscriptionStore>,
        cache: Arc<LoginCache>,
        notifier: Arc<dyn Notifier>,
        window: TimeDelta,
    ) -> Self {
        Self {
            subscriptions,
            cache,
            notifier,
            ledger: NotificationLedger::new(),
            window,
        }
    }

    /// Notify every subscriber of every recent login they have not been told about yet.
    ///
    /// Works on one cache snapshot. A failed delivery is counted and skipped,
    /// and is not recorded, so the next sweep tries again while the login is
    /// still recent.
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let snapshot = self.cache.snapshot().await;
        let subscriptions = self.subscriptions.list_all().await;
        let mut report = SweepReport::default();

        let mut recent: Vec<(PlayerName, DateTime<Utc>)> = snapshot
            .iter()
            .filter(|(_, at)| is_recent(**at, now, self.window))
            .map(|(player, at)| (*player, *at))
            .collect();
        recent.sort_unstable();
        report.recent = recent.len();

        for (player, login) in recent {
            let followers = subscriptions
                .iter()
                .filter(|(_, handles)| handles.contains(&player));

            for (subscriber, _) in followers {
                if self.ledger.already_notified(subscriber, player, login).await {
                    report.suppressed += 1;
                    continue;
                }

                match self.notifier.notify(subscriber, &player).await {
                    Ok(()) => {
                        self.ledger.record(subscriber, player, login).await;
                        report.delivered += 1;
                        tracing::info!(%subscriber, %player, last_login = %login, "notified subscriber");
                    }
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(%subscriber, %player, error = %e, "failed to notify subscriber");
                    }
                }
            }
        }

        if let Some(cutoff) = now.checked_sub_signed(self.window) {
            let pruned = self.ledger.prune_before(cutoff).await;
            if pruned > 0 {
                tracing::debug!(pruned, "pruned stale notification records");
            }
        }

        tracing::debug!(
            recent = report.recent,
            delivered = report.delivered,
            suppressed = report.suppressed,
            failed = report.failed,
            "notification sweep finished"
        );
        report
    }
}
