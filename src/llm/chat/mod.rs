pub mod anthropic;
pub mod gemini;

use async_trait::async_trait;
use log::warn;
use reqwest::{ Client as HttpClient, RequestBuilder };
use serde::de::DeserializeOwned;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::{ LlmConfig, LlmType };
use self::anthropic::AnthropicChatClient;
use self::gemini::GeminiChatClient;
use crate::models::chat::Turn;

/// How a provider call can fail. Each variant maps to a different
/// user-facing fallback message.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("provider returned HTTP {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
    #[error("provider response did not contain a reply")]
    EmptyReply,
    #[error("request to provider failed: {0}")]
    Transport(reqwest::Error),
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends the system directive and the whole turn sequence, returning the
    /// assistant's reply text.
    async fn complete(&self, system: &str, turns: &[Turn]) -> Result<String, ChatError>;

    fn llm_type(&self) -> LlmType;
    fn get_model(&self) -> String;
    fn get_base_url(&self) -> String;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::Anthropic => {
            let specific_client = AnthropicChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::Gemini => {
            let specific_client = GeminiChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}

pub(crate) fn build_http_client(
    builder: reqwest::ClientBuilder,
    timeout: Option<Duration>
) -> Result<HttpClient, Box<dyn StdError + Send + Sync>> {
    let builder = match timeout {
        Some(t) => builder.timeout(t),
        None => builder,
    };
    builder.build().map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)
}

pub(crate) fn endpoint(base_url: &str, route: &str) -> Result<Url, Box<dyn StdError + Send + Sync>> {
    let raw = format!("{}/{}", base_url.trim_end_matches('/'), route.trim_start_matches('/'));
    Url::parse(&raw).map_err(|e| format!("Invalid provider URL '{}': {}", raw, e).into())
}

/// Sends the request and decodes a successful body. A body that is not the
/// expected JSON counts as a missing reply rather than a transport failure.
///
/// URLs are stripped from transport errors since some providers carry the
/// API key in the query string.
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ChatError> {
    let resp = request.send().await.map_err(|e| ChatError::Transport(e.without_url()))?;
    let status = resp.status();
    let body = resp.text().await.map_err(|e| ChatError::Transport(e.without_url()))?;
    if !status.is_success() {
        return Err(ChatError::Status {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str::<T>(&body).map_err(|e| {
        warn!("Could not decode provider response: {}", e);
        ChatError::EmptyReply
    })
}

/// Rejects blank replies; the messaging platform refuses empty texts anyway.
pub(crate) fn non_empty(text: Option<String>) -> Result<String, ChatError> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(ChatError::EmptyReply),
    }
}
