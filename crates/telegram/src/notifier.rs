//! ChatNotifier over the Bot API

use crate::client::TelegramClient;
use crate::messages;
use async_trait::async_trait;
use clipqueue_core::domain::{JobFailure, ReplyHandle};
use clipqueue_core::port::{ChatNotifier, DeliveryError};
use std::path::Path;
use std::sync::Arc;

/// Reports job progress by editing the status message the handler posted
pub struct TelegramNotifier {
    client: Arc<TelegramClient>,
}

impl TelegramNotifier {
    pub fn new(client: Arc<TelegramClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatNotifier for TelegramNotifier {
    async fn mark_in_progress(&self, reply: &ReplyHandle) -> Result<(), DeliveryError> {
        // Status message not posted yet: nothing to edit
        let Some(status_id) = reply.status.get() else {
            return Ok(());
        };
        self.client
            .edit_message_text(reply.chat_id, status_id, messages::DOWNLOADING)
            .await?;
        Ok(())
    }

    async fn deliver_media(
        &self,
        reply: &ReplyHandle,
        file_path: &Path,
    ) -> Result<(), DeliveryError> {
        self.client
            .send_video(
                reply.chat_id,
                file_path,
                messages::DELIVERY_CAPTION,
                Some(reply.request_message_id),
            )
            .await?;
        Ok(())
    }

    async fn report_failure(
        &self,
        reply: &ReplyHandle,
        failure: &JobFailure,
    ) -> Result<(), DeliveryError> {
        let text = messages::failure(failure);
        match reply.status.get() {
            Some(status_id) => {
                self.client
                    .edit_message_text(reply.chat_id, status_id, &text)
                    .await?
            }
            None => {
                self.client
                    .send_message(reply.chat_id, &text, Some(reply.request_message_id), None)
                    .await?;
            }
        }
        Ok(())
    }

    async fn clear_status(&self, reply: &ReplyHandle) -> Result<(), DeliveryError> {
        let Some(status_id) = reply.status.get() else {
            return Ok(());
        };
        self.client.delete_message(reply.chat_id, status_id).await?;
        Ok(())
    }
}
