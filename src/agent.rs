use crate::cli::Args;
use crate::config::prompt::{ initialize_prompts, PromptConfig };
use crate::history::{ initialize_history_store, HistoryStore };
use crate::llm::{ LlmConfig, LlmType };
use crate::llm::chat::{ ChatClient, ChatError, new_client as new_chat_client };
use crate::models::chat::Turn;

use log::{ info, warn, error };
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{ Mutex, OwnedMutexGuard };

/// Produces assistant replies and keeps each chat's history in step.
///
/// The user turn is recorded before the provider call; the assistant turn
/// only after a usable reply. Failed calls therefore leave a dangling user
/// turn, never a partial exchange.
#[derive(Clone)]
pub struct ChatAgent {
    chat_client: Arc<dyn ChatClient>,
    history_store: Arc<dyn HistoryStore>,
    prompt_config: Arc<PromptConfig>,
    chat_locks: Option<Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>>,
}

impl ChatAgent {
    fn initialize_llm_client(args: &Args) -> Result<Arc<dyn ChatClient>, Box<dyn Error + Send + Sync>> {
        let chat_llm_type: LlmType = args.chat_llm_type.parse()?;
        let chat_config = LlmConfig {
            llm_type: chat_llm_type,
            base_url: args.chat_base_url.clone(),
            api_key: Some(args.chat_api_key.clone()).filter(|k| !k.trim().is_empty()),
            completion_model: args.chat_model.clone(),
            max_tokens: args.chat_max_tokens,
            temperature: args.chat_temperature,
            timeout: args.request_timeout_secs.map(Duration::from_secs),
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={}",
            chat_llm_type,
            chat_client.get_model(),
            chat_client.get_base_url()
        );
        Ok(chat_client)
    }

    pub fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let chat_client = Self::initialize_llm_client(args)?;
        let history_store = initialize_history_store(args)?;
        let prompt_config = initialize_prompts(args.prompts_path.as_deref())?;
        Ok(Self::with_components(chat_client, history_store, prompt_config, args.serialize_chats))
    }

    pub fn with_components(
        chat_client: Arc<dyn ChatClient>,
        history_store: Arc<dyn HistoryStore>,
        prompt_config: Arc<PromptConfig>,
        serialize_chats: bool
    ) -> Self {
        Self {
            chat_client,
            history_store,
            prompt_config,
            chat_locks: serialize_chats.then(|| Arc::new(Mutex::new(HashMap::new()))),
        }
    }

    pub fn provider(&self) -> LlmType {
        self.chat_client.llm_type()
    }

    pub fn prompts(&self) -> &PromptConfig {
        &self.prompt_config
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history_store
    }

    /// Entries nobody holds or waits on are dropped before a new one is
    /// taken, so the map only tracks chats with work in flight.
    async fn lock_chat(&self, conversation_id: i64) -> Option<OwnedMutexGuard<()>> {
        let locks = self.chat_locks.as_ref()?;
        let lock = {
            let mut locks = locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(conversation_id).or_default().clone()
        };
        Some(lock.lock_owned().await)
    }

    #[cfg(test)]
    async fn tracked_chat_locks(&self) -> usize {
        match &self.chat_locks {
            Some(locks) => locks.lock().await.len(),
            None => 0,
        }
    }

    /// Always yields text for the user: either the model's reply or one of
    /// the fixed fallback messages.
    pub async fn generate_reply(
        &self,
        conversation_id: i64,
        user_message: &str,
        user_name: &str
    ) -> String {
        let _guard = self.lock_chat(conversation_id).await;

        let turns = match self.history_store.append(conversation_id, Turn::user(user_message)).await {
            Ok(turns) => turns,
            Err(e) => {
                error!("History write (user) failed for chat {}: {}", conversation_id, e);
                return self.prompt_config.transport_error_message.clone();
            }
        };

        let system = self.prompt_config.system_prompt(user_name);
        let provider = self.provider().display_name();

        match self.chat_client.complete(&system, &turns).await {
            Ok(reply) => {
                if
                    let Err(e) = self.history_store.append(
                        conversation_id,
                        Turn::assistant(reply.clone())
                    ).await
                {
                    warn!("History write (assistant) failed for chat {}: {}", conversation_id, e);
                }
                reply
            }
            Err(ChatError::Status { status, body }) => {
                error!("{} API Error (HTTP {}): {}", provider, status, body);
                self.prompt_config.api_error_message.clone()
            }
            Err(ChatError::EmptyReply) => {
                warn!("{} returned no usable reply for chat {}", provider, conversation_id);
                self.prompt_config.empty_reply_message.clone()
            }
            Err(e @ ChatError::Transport(_)) => {
                error!("Error calling {}: {}", provider, e);
                self.prompt_config.transport_error_message.clone()
            }
        }
    }
}
