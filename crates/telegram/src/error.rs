//! Telegram Error Types

use clipqueue_core::port::DeliveryError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TelegramError>;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Invalid bot token")]
    InvalidToken,

    #[error("Bot API error ({code}): {description}")]
    Api { code: i32, description: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TelegramError::Transport(format!("Malformed Bot API response: {}", e))
        } else {
            TelegramError::Transport(e.to_string())
        }
    }
}

impl From<TelegramError> for DeliveryError {
    fn from(e: TelegramError) -> Self {
        match e {
            TelegramError::Api { .. } => DeliveryError::Api(e.to_string()),
            TelegramError::Io(io) => DeliveryError::Io(io),
            other => DeliveryError::Transport(other.to_string()),
        }
    }
}
