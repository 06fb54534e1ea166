//! Long-polling ingress

use crate::client::TelegramClient;
use crate::handler::BotHandler;
use clipqueue_core::application::ShutdownToken;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Server-side long-poll timeout
    pub timeout_secs: u64,
    /// Pause after a failed getUpdates
    pub error_backoff: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            error_backoff: Duration::from_secs(3),
        }
    }
}

/// Pulls updates with getUpdates and hands them to the [`BotHandler`]
pub struct Poller {
    client: Arc<TelegramClient>,
    handler: Arc<BotHandler>,
    config: PollerConfig,
}

impl Poller {
    pub fn new(client: Arc<TelegramClient>, handler: Arc<BotHandler>, config: PollerConfig) -> Self {
        Self {
            client,
            handler,
            config,
        }
    }

    /// Poll until shutdown. Pending updates from before start are dropped.
    pub async fn run(self, mut shutdown: ShutdownToken) {
        match self.client.delete_webhook(true).await {
            Ok(_) => info!("Starting bot in polling mode..."),
            Err(e) => warn!(error = %e, "Failed to drop pending updates"),
        }

        let mut offset: Option<i64> = None;

        loop {
            if shutdown.is_shutdown() {
                break;
            }

            let batch = tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                batch = self.client.get_updates(offset, self.config.timeout_secs) => batch,
            };

            match batch {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        self.handler.handle_update(update).await;
                    }
                }
                Err(e) => {
                    error!(error = %e, "getUpdates failed");
                    tokio::select! {
                        biased;
                        _ = shutdown.wait() => break,
                        _ = tokio::time::sleep(self.config.error_backoff) => {}
                    }
                }
            }
        }

        info!("Poller stopped");
    }
}
