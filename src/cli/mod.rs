use crate::history::DEFAULT_HISTORY_WINDOW;
use clap::Parser;
use std::error::Error;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Telegram Args ---
    /// Bot token issued by @BotFather. Required.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", default_value = "", hide_env_values = true)]
    pub telegram_bot_token: String,

    /// Base URL of the Telegram Bot API (override for local Bot API servers or tests)
    #[arg(long, env = "TELEGRAM_API_URL")]
    pub telegram_api_url: Option<String>,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (anthropic, gemini)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "anthropic")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API. Adapters pick the public endpoint if unset.
    #[arg(long, env = "CHAT_BASE_URL")]
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider. Required.
    #[arg(long, env = "CHAT_API_KEY", default_value = "", hide_env_values = true)]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., claude-sonnet-4-20250514, gemini-2.0-flash)
    #[arg(long, env = "CHAT_MODEL")]
    pub chat_model: Option<String>,

    /// Upper bound on generated tokens per reply.
    #[arg(long, env = "CHAT_MAX_TOKENS", default_value = "1024")]
    pub chat_max_tokens: u32,

    /// Sampling temperature passed to the provider.
    #[arg(long, env = "CHAT_TEMPERATURE", default_value = "0.7")]
    pub chat_temperature: f32,

    // --- History Store Args ---
    /// History chat store type (memory)
    #[arg(long, env = "HISTORY_TYPE", default_value = "memory")]
    pub history_type: String,

    /// Maximum number of turns kept per chat; oldest turns are dropped first.
    #[arg(long, env = "HISTORY_WINDOW", default_value_t = DEFAULT_HISTORY_WINDOW)]
    pub history_window: usize,

    // --- General App Args ---
    /// Host address and port for the webhook server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:8000")]
    pub server_addr: String,

    /// Optional JSON file overriding the built-in prompts and messages.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    /// Timeout in seconds for outbound HTTP calls. Unset means no explicit timeout.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Handle messages of the same chat one at a time.
    #[arg(long, env = "SERIALIZE_CHATS", default_value = "false")]
    pub serialize_chats: bool,
}

impl Args {
    /// Missing credentials are the only fatal configuration errors.
    pub fn validate(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.telegram_bot_token.trim().is_empty() {
            return Err("TELEGRAM_BOT_TOKEN is not set".into());
        }
        if self.chat_api_key.trim().is_empty() {
            return Err("CHAT_API_KEY is not set".into());
        }
        Ok(())
    }
}
