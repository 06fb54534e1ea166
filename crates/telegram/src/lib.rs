//! ClipQueue Telegram front end
//!
//! Talks to the Telegram Bot API over plain HTTPS:
//! - [`TelegramClient`]: thin typed wrapper over the Bot API methods the bot uses
//! - [`BotHandler`]: turns incoming updates into commands and submissions
//! - [`Poller`]: long-polling ingress (webhook updates go straight to the handler)
//! - [`TelegramNotifier`]: the `ChatNotifier` the worker reports through
//!
//! # Example
//!
//! ```no_run
//! use clipqueue_telegram::TelegramClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TelegramClient::new("123456:ABC-DEF")?;
//! client.send_message(42, "hello", None, None).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod handler;
pub mod messages;
mod notifier;
mod poller;
mod types;

pub use client::{ParseMode, TelegramClient, DEFAULT_API_BASE};
pub use error::{Result, TelegramError};
pub use handler::{BotCommand, BotHandler};
pub use notifier::TelegramNotifier;
pub use poller::{Poller, PollerConfig};
pub use types::{Chat, Message, Update, User};
