//! Outbound Telegram Bot API calls.
//!
//! The bot token is part of every request path, so request URLs never reach
//! the logs: errors are stripped of their URL before being returned.

use async_trait::async_trait;
use log::{ debug, warn };
use reqwest::Client as HttpClient;
use serde::Serialize;
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram returned HTTP {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
    #[error("Telegram request failed: {0}")]
    Transport(reqwest::Error),
}

/// Where replies go. Production uses [`TelegramClient`]; tests record calls.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to_message_id: Option<i64>
    ) -> Result<(), TelegramError>;

    /// Best-effort "typing…" indicator. Never fails.
    async fn send_typing(&self, chat_id: i64);
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
}

#[derive(Serialize)]
struct SendChatActionRequest {
    chat_id: i64,
    action: &'static str,
}

pub struct TelegramClient {
    http: HttpClient,
    api_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(
        token: String,
        api_url: Option<String>,
        timeout: Option<Duration>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_url = api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Url::parse(&api_url).map_err(|e| format!("Invalid Telegram API URL '{}': {}", api_url, e))?;

        let builder = HttpClient::builder();
        let builder = match timeout {
            Some(t) => builder.timeout(t),
            None => builder,
        };

        Ok(Self {
            http: builder.build()?,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    async fn post<T: Serialize + ?Sized>(&self, method: &str, payload: &T) -> Result<(), TelegramError> {
        let resp = self.http
            .post(self.method_url(method))
            .json(payload)
            .send().await
            .map_err(|e| TelegramError::Transport(e.without_url()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TelegramError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    /// Sends with Markdown first; AI output often has unbalanced markup, so a
    /// rejected send is retried once as plain text.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to_message_id: Option<i64>
    ) -> Result<(), TelegramError> {
        let mut req = SendMessageRequest {
            chat_id,
            text,
            parse_mode: Some("Markdown"),
            reply_to_message_id,
        };

        let first_attempt = self.post("sendMessage", &req).await;
        if let Err(e) = first_attempt {
            warn!("sendMessage to chat {} failed ({}), retrying without Markdown", chat_id, e);
            req.parse_mode = None;
            return self.post("sendMessage", &req).await;
        }
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) {
        let req = SendChatActionRequest {
            chat_id,
            action: "typing",
        };
        if let Err(e) = self.post("sendChatAction", &req).await {
            debug!("Ignoring typing indicator failure for chat {}: {}", chat_id, e);
        }
    }
}
