//! In-process fakes for the provider and messenger seams.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::llm::chat::{ ChatClient, ChatError };
use crate::llm::LlmType;
use crate::models::chat::Turn;
use crate::telegram::{ Messenger, TelegramError };

/// Replies from a script and records every request it sees.
pub struct ScriptedChatClient {
    replies: Mutex<VecDeque<Result<String, ChatError>>>,
    pub requests: Mutex<Vec<(String, Vec<Turn>)>>,
}

impl ScriptedChatClient {
    pub fn new(replies: Vec<Result<String, ChatError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    async fn complete(&self, system: &str, turns: &[Turn]) -> Result<String, ChatError> {
        self.requests.lock().unwrap().push((system.to_string(), turns.to_vec()));
        self.replies.lock().unwrap().pop_front().unwrap_or(Err(ChatError::EmptyReply))
    }

    fn llm_type(&self) -> LlmType {
        LlmType::Anthropic
    }

    fn get_model(&self) -> String {
        "scripted".to_string()
    }

    fn get_base_url(&self) -> String {
        "memory://scripted".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Message {
        chat_id: i64,
        text: String,
        reply_to: Option<i64>,
    },
    Typing {
        chat_id: i64,
    },
}

#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<Outbound>>,
}

impl RecordingMessenger {
    pub fn outbound(&self) -> Vec<Outbound> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to_message_id: Option<i64>
    ) -> Result<(), TelegramError> {
        self.sent.lock().unwrap().push(Outbound::Message {
            chat_id,
            text: text.to_string(),
            reply_to: reply_to_message_id,
        });
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) {
        self.sent.lock().unwrap().push(Outbound::Typing { chat_id });
    }
}
