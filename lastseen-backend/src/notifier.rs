use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude::{CreateMessage, Http, UserId};

use crate::dispatcher::Notifier;
use crate::error::NotifyError;
use crate::helpers::format_notification;

/// Delivers login notifications as Discord direct messages.
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, subscriber: &str, player: &str) -> Result<(), NotifyError> {
        let user = parse_user_id(subscriber)?;
        let message = CreateMessage::new().content(format_notification(subscriber, player));
        user.direct_message(&*self.http, message).await?;
        Ok(())
    }
}

/// Discord snowflakes are non-zero u64s.
fn parse_user_id(subscriber: &str) -> Result<UserId, NotifyError> {
    subscriber
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(UserId::new)
        .ok_or_else(|| NotifyError::InvalidSubscriber(subscriber.to_string()))
}
