//! Update handling: commands and link submissions

use crate::client::{ParseMode, TelegramClient};
use crate::error::Result;
use crate::messages;
use crate::types::{Message, Update, User};
use clipqueue_core::application::{QueueService, Submission};
use clipqueue_core::domain::{Rejection, ReplyHandle};
use clipqueue_core::port::StatsStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What an incoming text asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand<'a> {
    Start,
    Help,
    Stats,
    /// Command the bot does not know; ignored
    Unknown(&'a str),
    /// Anything that is not a command is treated as a link submission
    Submit(&'a str),
}

impl<'a> BotCommand<'a> {
    /// Accepts `/cmd`, `/cmd@botname` and trailing arguments
    pub fn parse(text: &'a str) -> Self {
        let trimmed = text.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return BotCommand::Submit(trimmed);
        };
        let word = rest.split_whitespace().next().unwrap_or_default();
        let name = word.split('@').next().unwrap_or_default();
        match name {
            "start" => BotCommand::Start,
            "help" => BotCommand::Help,
            "stats" => BotCommand::Stats,
            other => BotCommand::Unknown(other),
        }
    }
}

/// Dispatches updates to commands or to the queue service
pub struct BotHandler {
    client: Arc<TelegramClient>,
    service: Arc<QueueService>,
    stats: Arc<dyn StatsStore>,
}

impl BotHandler {
    pub fn new(
        client: Arc<TelegramClient>,
        service: Arc<QueueService>,
        stats: Arc<dyn StatsStore>,
    ) -> Self {
        Self {
            client,
            service,
            stats,
        }
    }

    /// Handle one update; failures are logged, never propagated
    pub async fn handle_update(&self, update: Update) {
        let update_id = update.update_id;
        if let Err(e) = self.dispatch(update).await {
            warn!(update_id, error = %e, "Failed to handle update");
        }
    }

    async fn dispatch(&self, update: Update) -> Result<()> {
        let Some(message) = update.message else {
            return Ok(());
        };
        let (Some(user), Some(text)) = (message.from.as_ref(), message.text.as_deref()) else {
            debug!(update_id = update.update_id, "Ignoring update without sender or text");
            return Ok(());
        };

        match BotCommand::parse(text) {
            BotCommand::Start | BotCommand::Help => self.welcome(&message, user).await,
            BotCommand::Stats => self.personal_stats(&message, user).await,
            BotCommand::Submit(url) => self.submit(&message, user, url).await,
            BotCommand::Unknown(name) => {
                debug!(command = name, "Ignoring unknown command");
                Ok(())
            }
        }
    }

    async fn welcome(&self, message: &Message, user: &User) -> Result<()> {
        if let Err(e) = self.stats.record_user(user.id, user.display_name()).await {
            warn!(submitter_id = user.id, error = %e, "Failed to record user");
        }

        let cooldown_secs = self.service.config().cooldown.as_secs();
        self.client
            .send_message(
                message.chat.id,
                &messages::welcome(&user.first_name, cooldown_secs),
                None,
                Some(ParseMode::Markdown),
            )
            .await?;
        Ok(())
    }

    async fn personal_stats(&self, message: &Message, user: &User) -> Result<()> {
        let text = match self.stats.user_stats(user.id).await {
            Ok(stats) => messages::personal_stats(&stats, chrono::Utc::now()),
            Err(e) => {
                warn!(submitter_id = user.id, error = %e, "Failed to load user stats");
                messages::STATS_UNAVAILABLE.to_string()
            }
        };
        self.client
            .send_message(message.chat.id, &text, None, Some(ParseMode::Markdown))
            .await?;
        Ok(())
    }

    async fn submit(&self, message: &Message, user: &User, url: &str) -> Result<()> {
        let chat_id = message.chat.id;
        let reply = ReplyHandle::new(chat_id, message.message_id);
        let status = reply.status.clone();

        let text = match self.service.submit(Submission::new(user.id, url, reply)) {
            Ok(accepted) => messages::queued(accepted.position),
            Err(Rejection::InvalidSubmission(reason)) => {
                debug!(submitter_id = user.id, reason = %reason, "Submission rejected");
                messages::invalid_link()
            }
            Err(Rejection::CooldownActive { remaining_seconds }) => {
                info!(submitter_id = user.id, remaining_seconds, "Submission in cooldown");
                messages::cooldown(remaining_seconds)
            }
        };

        let posted = self
            .client
            .send_message(chat_id, &text, None, Some(ParseMode::Markdown))
            .await?;

        // Rejections leave the slot unused; nobody reads it
        status.set(posted.message_id);
        Ok(())
    }
}
