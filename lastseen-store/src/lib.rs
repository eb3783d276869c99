//! State layer for lastseen: who follows whom, and when they last logged in.

mod cache;
mod error;
mod ledger;
mod models;
mod subscriptions;

pub use cache::{LoginCache, RefreshGuard};
pub use error::{Result, StoreError};
pub use ledger::NotificationLedger;
pub use models::{
  CacheInfo, LoginMap, PlayerName, SubscriberId, SubscriptionCounts, Subscriptions,
  is_valid_player_name,
};
pub use subscriptions::SubscriptionStore;
