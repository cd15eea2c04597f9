use log::{ debug, info, error };
use std::sync::Arc;

use super::commands::Command;
use crate::agent::ChatAgent;
use crate::models::telegram::Update;
use crate::telegram::Messenger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Nothing to act on: no message, no text or no chat.
    Ignored,
    Processed,
}

/// The fields of a text message the bot acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingText {
    pub chat_id: i64,
    pub message_id: Option<i64>,
    pub user_name: String,
    pub text: String,
}

impl IncomingText {
    pub fn from_update(update: &Update, default_user_name: &str) -> Option<Self> {
        let message = update.message.as_ref()?;
        let chat_id = message.chat.as_ref().and_then(|c| c.id).filter(|id| *id != 0)?;
        let text = message.text.as_deref().filter(|t| !t.is_empty())?;
        let user_name = message.from
            .as_ref()
            .and_then(|u| u.first_name.as_deref())
            .filter(|n| !n.is_empty())
            .unwrap_or(default_user_name);

        Some(Self {
            chat_id,
            message_id: message.message_id.filter(|id| *id != 0),
            user_name: user_name.to_string(),
            text: text.to_string(),
        })
    }
}

/// Handles each webhook update once, independently. Send failures are
/// logged and never retried here.
#[derive(Clone)]
pub struct UpdateHandler {
    agent: ChatAgent,
    messenger: Arc<dyn Messenger>,
}

impl UpdateHandler {
    pub fn new(agent: ChatAgent, messenger: Arc<dyn Messenger>) -> Self {
        Self { agent, messenger }
    }

    pub fn agent(&self) -> &ChatAgent {
        &self.agent
    }

    pub async fn handle_update(&self, update: &Update) -> UpdateOutcome {
        let incoming = match IncomingText::from_update(update, &self.agent.prompts().default_user_name) {
            Some(incoming) => incoming,
            None => {
                debug!("Ignoring update {:?}: no text message", update.update_id);
                return UpdateOutcome::Ignored;
            }
        };

        match Command::parse(&incoming.text) {
            Some(command) => {
                info!("Command {:?} from chat {}", command, incoming.chat_id);
                let response = command.execute(&self.agent, incoming.chat_id, &incoming.user_name).await;
                self.send(incoming.chat_id, &response, None).await;
            }
            None => {
                info!("Message from chat {} ({} chars)", incoming.chat_id, incoming.text.chars().count());
                self.messenger.send_typing(incoming.chat_id).await;
                let reply = self.agent.generate_reply(
                    incoming.chat_id,
                    &incoming.text,
                    &incoming.user_name
                ).await;
                self.send(incoming.chat_id, &reply, incoming.message_id).await;
            }
        }

        UpdateOutcome::Processed
    }

    async fn send(&self, chat_id: i64, text: &str, reply_to: Option<i64>) {
        if let Err(e) = self.messenger.send_message(chat_id, text, reply_to).await {
            error!("Failed to deliver message to chat {}: {}", chat_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::prompt::PromptConfig;
    use crate::history::{ HistoryStore, InMemoryHistoryStore };
    use crate::llm::chat::ChatError;
    use crate::models::chat::Turn;
    use crate::testing::{ Outbound, RecordingMessenger, ScriptedChatClient };

    struct Fixture {
        handler: UpdateHandler,
        store: Arc<InMemoryHistoryStore>,
        client: Arc<ScriptedChatClient>,
        messenger: Arc<RecordingMessenger>,
    }

    fn fixture(replies: Vec<Result<String, ChatError>>) -> Fixture {
        let store = Arc::new(InMemoryHistoryStore::new(20));
        let client = Arc::new(ScriptedChatClient::new(replies));
        let messenger = Arc::new(RecordingMessenger::default());
        let agent = ChatAgent::with_components(
            client.clone(),
            store.clone(),
            Arc::new(PromptConfig::default()),
            false
        );
        Fixture {
            handler: UpdateHandler::new(agent, messenger.clone()),
            store,
            client,
            messenger,
        }
    }

    fn update(raw: &str) -> Update {
        serde_json::from_str(raw).unwrap()
    }

    fn text_update(chat_id: i64, message_id: i64, text: &str) -> Update {
        update(
            &serde_json::json!({
                "update_id": 1,
                "message": {
                    "message_id": message_id,
                    "chat": {"id": chat_id, "type": "private"},
                    "from": {"id": chat_id, "first_name": "Sara"},
                    "text": text
                }
            }).to_string()
        )
    }

    #[tokio::test]
    async fn free_text_round_trip_threads_reply() {
        let f = fixture(vec![Ok("hi there".into())]);

        let outcome = f.handler.handle_update(&text_update(42, 7, "hello")).await;

        assert_eq!(outcome, UpdateOutcome::Processed);
        assert_eq!(
            f.messenger.outbound(),
            vec![
                Outbound::Typing { chat_id: 42 },
                Outbound::Message { chat_id: 42, text: "hi there".into(), reply_to: Some(7) }
            ]
        );
        assert_eq!(
            f.store.get_or_create(42).await.unwrap(),
            vec![Turn::user("hello"), Turn::assistant("hi there")]
        );
    }

    #[tokio::test]
    async fn malformed_updates_are_ignored_silently() {
        let f = fixture(vec![]);
        let cases = [
            r#"{"update_id": 1}"#,
            r#"{"update_id": 2, "message": {"message_id": 1, "chat": {"id": 5}, "text": ""}}"#,
            r#"{"update_id": 3, "message": {"message_id": 1, "chat": {"id": 5}}}"#,
            r#"{"update_id": 4, "message": {"message_id": 1, "text": "hello"}}"#,
            r#"{"update_id": 5, "message": {"message_id": 1, "chat": {"id": 0}, "text": "hello"}}"#,
        ];

        for raw in cases {
            assert_eq!(f.handler.handle_update(&update(raw)).await, UpdateOutcome::Ignored);
        }

        assert!(f.messenger.outbound().is_empty());
        assert_eq!(f.client.request_count(), 0);
        assert!(f.store.get_or_create(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn commands_answer_without_typing_or_threading() {
        let f = fixture(vec![]);
        f.store.append(42, Turn::user("old")).await.unwrap();

        f.handler.handle_update(&text_update(42, 3, "/start")).await;
        f.handler.handle_update(&text_update(42, 4, "/help")).await;
        assert_eq!(f.store.get_or_create(42).await.unwrap().len(), 1);

        f.handler.handle_update(&text_update(42, 5, "/clear")).await;
        assert!(f.store.get_or_create(42).await.unwrap().is_empty());

        let sent = f.messenger.outbound();
        assert_eq!(sent.len(), 3);
        assert!(
            sent.iter().all(|o| matches!(o, Outbound::Message { chat_id: 42, reply_to: None, .. }))
        );
        assert_eq!(f.client.request_count(), 0);
    }

    #[tokio::test]
    async fn missing_first_name_uses_default() {
        let f = fixture(vec![]);
        let raw = r#"{"message": {"message_id": 1, "chat": {"id": 9}, "text": "/start"}}"#;

        f.handler.handle_update(&update(raw)).await;

        match &f.messenger.outbound()[0] {
            Outbound::Message { text, .. } => assert!(text.contains("کاربر")),
            other => panic!("unexpected outbound call: {:?}", other),
        }
    }

    #[tokio::test]
    async fn provider_failure_still_answers_user() {
        let f = fixture(vec![Err(ChatError::Status { status: 503, body: "down".into() })]);

        f.handler.handle_update(&text_update(11, 2, "hello")).await;

        let sent = f.messenger.outbound();
        assert_eq!(
            sent.last(),
            Some(
                &(Outbound::Message {
                    chat_id: 11,
                    text: PromptConfig::default().api_error_message,
                    reply_to: Some(2),
                })
            )
        );
        assert_eq!(f.store.get_or_create(11).await.unwrap(), vec![Turn::user("hello")]);
    }
}
