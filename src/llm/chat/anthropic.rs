use async_trait::async_trait;
use log::info;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE } };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use url::Url;

use super::{ build_http_client, endpoint, non_empty, send_json, ChatClient, ChatError };
use crate::llm::{ LlmConfig, LlmType };
use crate::models::chat::Turn;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
    messages_url: Url,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: String,
    content: &'a str,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        max_tokens: u32,
        temperature: f32,
        timeout: Option<std::time::Duration>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let messages_url = endpoint(&api_url, "v1/messages")?;

        let mut key_header = HeaderValue::from_str(&api_key)
            .map_err(|e| format!("Invalid API key format: {}", e))?;
        key_header.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", key_header);
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));

        let http = build_http_client(HttpClient::builder().default_headers(headers), timeout)?;

        Ok(Self {
            http,
            model: chat_model,
            base_url: api_url,
            messages_url,
            max_tokens,
            temperature,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| "Anthropic API key is required for AnthropicChatClient".to_string())?;

        Self::new(
            api_key,
            config.completion_model.clone(),
            config.base_url.clone(),
            config.max_tokens,
            config.temperature,
            config.timeout
        )
    }
}

#[async_trait]
impl ChatClient for AnthropicChatClient {
    async fn complete(&self, system: &str, turns: &[Turn]) -> Result<String, ChatError> {
        let messages = turns
            .iter()
            .map(|turn| AnthropicMessage {
                role: turn.role.to_string(),
                content: &turn.content,
            })
            .collect();

        let req = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system,
            messages,
        };

        info!(
            "AnthropicChatClient::complete() → model={} url={} turns={}",
            self.model,
            self.messages_url,
            turns.len()
        );

        let resp: AnthropicResponse = send_json(
            self.http.post(self.messages_url.clone()).json(&req)
        ).await?;

        non_empty(resp.content.into_iter().next().and_then(|block| block.text))
    }

    fn llm_type(&self) -> LlmType {
        LlmType::Anthropic
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> String {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client(base_url: String) -> AnthropicChatClient {
        AnthropicChatClient::new(
            "test-key".to_string(),
            None,
            Some(base_url),
            1024,
            0.7,
            None
        ).unwrap()
    }

    #[tokio::test]
    async fn sends_flat_messages_with_header_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", "2023-06-01")
            .match_body(
                Matcher::PartialJson(
                    json!({
                    "model": "claude-sonnet-4-20250514",
                    "max_tokens": 1024,
                    "system": "be nice",
                    "messages": [
                        {"role": "user", "content": "hello"},
                        {"role": "assistant", "content": "hey"},
                        {"role": "user", "content": "how are you?"}
                    ]
                })
                )
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content":[{"type":"text","text":"fine, thanks"}]}"#)
            .create_async().await;

        let turns = vec![Turn::user("hello"), Turn::assistant("hey"), Turn::user("how are you?")];
        let reply = client(server.url()).complete("be nice", &turns).await.unwrap();

        assert_eq!(reply, "fine, thanks");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_carries_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body(r#"{"type":"error","error":{"type":"overloaded_error"}}"#)
            .create_async().await;

        let err = client(server.url()).complete("s", &[Turn::user("x")]).await.unwrap_err();
        match err {
            ChatError::Status { status, body } => {
                assert_eq!(status, 529);
                assert!(body.contains("overloaded_error"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_content_is_empty_reply() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"content":[]}"#)
            .create_async().await;

        let err = client(server.url()).complete("s", &[Turn::user("x")]).await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyReply));
    }

    #[test]
    fn rejects_missing_key() {
        let config = LlmConfig::default();
        assert!(AnthropicChatClient::from_config(&config).is_err());
    }
}
