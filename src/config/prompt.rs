use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt file IO error: {0}")] IoError(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")] JsonError(#[from] serde_json::Error),
}

/// Every user-facing string the relay produces.
///
/// `{user_name}` and `{provider}` placeholders are substituted at render
/// time. Keys absent from a prompts file keep their built-in value.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PromptConfig {
    pub system_template: String,
    pub start_template: String,
    pub help_template: String,
    pub clear_message: String,
    pub api_error_message: String,
    pub empty_reply_message: String,
    pub transport_error_message: String,
    pub default_user_name: String,
    pub health_message: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_template: concat!(
                "تو یک دستیار هوشمند فارسی‌زبان هستی که در تلگرام به کاربران کمک می‌کنی.\n",
                "نام کاربر: {user_name}\n",
                "- به فارسی پاسخ بده مگر اینکه کاربر به زبان دیگری بنویسد\n",
                "- پاسخ‌هات رو مختصر، مفید و دوستانه نگه دار\n",
                "- از ایموجی‌های مناسب استفاده کن"
            ).to_string(),
            start_template: concat!(
                "سلام {user_name}! 👋\n\n",
                "من یک دستیار هوشمند هستم که با {provider} AI ساخته شدم.\n\n",
                "می‌تونی هر سوالی داری بپرسی یا باهام گفتگو کنی! 🤖✨\n\n",
                "/help - راهنما\n",
                "/clear - پاک کردن تاریخچه مکالمه"
            ).to_string(),
            help_template: concat!(
                "📌 *راهنمای ربات*\n\n",
                "• فقط پیامت رو بفرست، من جواب می‌دم!\n",
                "• تاریخچه مکالمه رو نگه می‌دارم تا بهتر بفهمم\n",
                "• /clear برای شروع مکالمه جدید\n",
                "• به فارسی و انگلیسی پاسخ می‌دم\n\n",
                "_Powered by {provider} AI_ 🧠"
            ).to_string(),
            clear_message: "تاریخچه مکالمه پاک شد! 🗑️ بریم از اول شروع کنیم.".to_string(),
            api_error_message: "متأسفم، در ارتباط با هوش مصنوعی مشکلی پیش آمد. لطفاً دوباره امتحان کن. 🙏".to_string(),
            empty_reply_message: "پاسخی دریافت نشد. 🤔".to_string(),
            transport_error_message: "خطایی رخ داد. لطفاً دوباره امتحان کن. ⚠️".to_string(),
            default_user_name: "کاربر".to_string(),
            health_message: "Telegram AI Bot is running! 🤖".to_string(),
        }
    }
}

impl PromptConfig {
    pub fn system_prompt(&self, user_name: &str) -> String {
        self.system_template.replace("{user_name}", user_name)
    }

    pub fn start_message(&self, user_name: &str, provider: &str) -> String {
        self.start_template.replace("{user_name}", user_name).replace("{provider}", provider)
    }

    pub fn help_message(&self, provider: &str) -> String {
        self.help_template.replace("{provider}", provider)
    }
}

pub fn load_prompts(path: &str) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    info!("Loaded prompt overrides from '{}'", path);
    Ok(Arc::new(config))
}

/// Built-in prompts unless a prompts file is configured.
pub fn initialize_prompts(path: Option<&str>) -> Result<Arc<PromptConfig>, PromptError> {
    match path.filter(|p| !p.trim().is_empty()) {
        Some(p) => load_prompts(p),
        None => Ok(Arc::new(PromptConfig::default())),
    }
}
