use log::{ info, error };

use crate::agent::ChatAgent;

/// Control commands. Matched exactly and case-sensitively; anything after
/// the command word makes the text an ordinary message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Clear,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "/start" => Some(Command::Start),
            "/help" => Some(Command::Help),
            "/clear" => Some(Command::Clear),
            _ => None,
        }
    }

    /// Runs the command and returns the canned answer. Only `/clear`
    /// touches history.
    pub async fn execute(&self, agent: &ChatAgent, chat_id: i64, user_name: &str) -> String {
        let prompts = agent.prompts();
        let provider = agent.provider().display_name();
        match self {
            Command::Start => prompts.start_message(user_name, provider),
            Command::Help => prompts.help_message(provider),
            Command::Clear => {
                match agent.history().clear(chat_id).await {
                    Ok(()) => info!("Cleared history for chat {}", chat_id),
                    Err(e) => error!("Failed to clear history for chat {}: {}", chat_id, e),
                }
                prompts.clear_message.clone()
            }
        }
    }
}
