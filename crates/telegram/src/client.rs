//! Telegram Bot API client

use crate::error::{Result, TelegramError};
use crate::types::{ApiResponse, Message, Update};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

// Uploads can be slow; long polls get their own per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Text formatting for outgoing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Markdown,
}

impl ParseMode {
    fn as_str(self) -> &'static str {
        match self {
            ParseMode::Markdown => "Markdown",
        }
    }
}

// Optional parameters are omitted rather than sent as null

#[derive(Serialize)]
struct GetUpdates<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

/// Bot API client bound to one bot token
///
/// Cheap to share behind an `Arc`; reqwest pools connections internally.
pub struct TelegramClient {
    http: Client,
    endpoint: String,
}

impl TelegramClient {
    /// Client for the public Bot API
    pub fn new(token: &str) -> Result<Self> {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Client for a custom API server (local Bot API server, tests)
    pub fn with_api_base(token: &str, api_base: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() || token.contains('/') {
            return Err(TelegramError::InvalidToken);
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TelegramError::Transport(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.endpoint, method)
    }

    async fn call<P, R>(&self, method: &str, params: &P, timeout: Option<Duration>) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(method, "Bot API call");
        let mut request = self.http.post(self.method_url(method)).json(params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        Self::unwrap_response(response).await
    }

    // Bot API answers errors with a JSON body and a non-2xx status; read the body either way
    async fn unwrap_response<R: DeserializeOwned>(response: reqwest::Response) -> Result<R> {
        let status = response.status();
        let body = response.bytes().await?;
        let parsed: ApiResponse<R> = serde_json::from_slice(&body).map_err(|e| {
            if status.is_success() {
                TelegramError::Serialization(e)
            } else {
                TelegramError::Api {
                    code: i32::from(status.as_u16()),
                    description: String::from_utf8_lossy(&body).into_owned(),
                }
            }
        })?;

        match parsed {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            other => Err(TelegramError::Api {
                code: other.error_code.unwrap_or(i32::from(status.as_u16())),
                description: other
                    .description
                    .unwrap_or_else(|| "missing result".to_string()),
            }),
        }
    }

    /// Long-poll for updates with `update_id >= offset`
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let params = GetUpdates {
            offset,
            timeout: timeout_secs,
            allowed_updates: &["message"],
        };
        self.call(
            "getUpdates",
            &params,
            Some(Duration::from_secs(timeout_secs + 10)),
        )
        .await
    }

    /// Remove any webhook so getUpdates works
    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<bool> {
        self.call(
            "deleteWebhook",
            &json!({ "drop_pending_updates": drop_pending_updates }),
            None,
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
        parse_mode: Option<ParseMode>,
    ) -> Result<Message> {
        let params = SendMessage {
            chat_id,
            text,
            reply_to_message_id: reply_to,
            parse_mode: parse_mode.map(ParseMode::as_str),
        };
        self.call("sendMessage", &params, None).await
    }

    pub async fn edit_message_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        let params = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        // Result is the edited Message (or `true` for inline messages)
        let _: serde_json::Value = self.call("editMessageText", &params, None).await?;
        Ok(())
    }

    pub async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let params = json!({ "chat_id": chat_id, "message_id": message_id });
        let _: bool = self.call("deleteMessage", &params, None).await?;
        Ok(())
    }

    /// Upload a local video file
    pub async fn send_video(
        &self,
        chat_id: i64,
        file_path: &Path,
        caption: &str,
        reply_to: Option<i64>,
    ) -> Result<Message> {
        let bytes = tokio::fs::read(file_path).await?;
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".to_string());

        let video = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("video/mp4")
            .map_err(|e| TelegramError::Transport(e.to_string()))?;

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("video", video);
        if let Some(reply_to) = reply_to {
            form = form.text("reply_to_message_id", reply_to.to_string());
        }

        debug!(chat_id, "Bot API call: sendVideo");
        let response = self
            .http
            .post(self.method_url("sendVideo"))
            .multipart(form)
            .send()
            .await?;
        Self::unwrap_response(response).await
    }
}
