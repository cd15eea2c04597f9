use async_trait::async_trait;
use log::info;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use url::Url;

use super::{ build_http_client, endpoint, non_empty, send_json, ChatClient, ChatError };
use crate::llm::{ LlmConfig, LlmType };
use crate::models::chat::{ Role, Turn };

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    #[serde(rename = "system_instruction")]
    system_instruction: GeminiSystemInstruction<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiSystemInstruction<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    #[serde(default)]
    content: Option<GoogleContent>,
}

#[derive(Deserialize)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    #[serde(default)]
    text: Option<String>,
}

fn gemini_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

pub struct GeminiChatClient {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
    generate_url: Url,
    max_tokens: u32,
    temperature: f32,
}

impl GeminiChatClient {
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
        let generate_url = endpoint(
            &api_url,
            &format!("v1beta/models/{}:generateContent", chat_model)
        )?;

        let http = build_http_client(HttpClient::builder(), timeout)?;

        Ok(Self {
            http,
            api_key,
            model: chat_model,
            base_url: api_url,
            generate_url,
            max_tokens,
            temperature,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| "Google API key is required for GeminiChatClient".to_string())?;

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
impl ChatClient for GeminiChatClient {
    async fn complete(&self, system: &str, turns: &[Turn]) -> Result<String, ChatError> {
        let contents = turns
            .iter()
            .map(|turn| GeminiContent {
                role: gemini_role(turn.role),
                parts: vec![GeminiPart { text: &turn.content }],
            })
            .collect();

        let payload = GeminiRequest {
            system_instruction: GeminiSystemInstruction {
                parts: vec![GeminiPart { text: system }],
            },
            contents,
            generation_config: GeminiGenerationConfig {
                max_output_tokens: self.max_tokens,
                temperature: self.temperature,
            },
        };

        // the key travels in the query string, so only the bare URL is logged
        info!(
            "GeminiChatClient::complete() → model={} url={} turns={}",
            self.model,
            self.generate_url,
            turns.len()
        );

        let resp: GoogleResponse = send_json(
            self.http
                .post(self.generate_url.clone())
                .query(&[("key", self.api_key.as_str())])
                .json(&payload)
        ).await?;

        let text = resp.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text);
        non_empty(text)
    }

    fn llm_type(&self) -> LlmType {
        LlmType::Gemini
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> String {
        self.base_url.clone()
    }
}
