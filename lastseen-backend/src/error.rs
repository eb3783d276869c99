use thiserror::Error;

/// Fatal startup configuration problems
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),
}

/// Why a login lookup came back empty.
/// Only logged; callers see every variant as "unknown".
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no Minecraft account named {0}")]
    UnknownPlayer(String),

    #[error("Hypixel rejected the request: {0}")]
    Rejected(String),

    #[error("invalid lastLogin timestamp {0}")]
    InvalidTimestamp(i64),

    #[error("invalid API base URL {0}")]
    InvalidBaseUrl(String),
}

/// Failure to deliver a single notification
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("subscriber id {0} is not a Discord user id")]
    InvalidSubscriber(String),

    #[error("Discord error: {0}")]
    Discord(#[from] poise::serenity_prelude::Error),
}
