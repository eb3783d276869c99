use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("subscription file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize subscriptions: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("player is already in the monitored list")]
    AlreadyExists,

    #[error("player is not in the monitored list")]
    NotFound,

    #[error("invalid player name (1-16 letters, digits or underscores)")]
    InvalidPlayerName,
}

pub type Result<T> = std::result::Result<T, StoreError>;
