use async_trait::async_trait;
use crate::models::chat::Turn;
use crate::history::HistoryStore;
use std::collections::{ HashMap, VecDeque };
use std::error::Error;
use tokio::sync::RwLock;
use log::debug;

/// Process-local history. Lost on restart.
pub struct InMemoryHistoryStore {
    conversations: RwLock<HashMap<i64, VecDeque<Turn>>>,
    window: usize,
}

impl InMemoryHistoryStore {
    pub fn new(window: usize) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            window: window.max(1),
        }
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn get_or_create(
        &self,
        conversation_id: i64
    ) -> Result<Vec<Turn>, Box<dyn Error + Send + Sync>> {
        if let Some(turns) = self.conversations.read().await.get(&conversation_id) {
            return Ok(turns.iter().cloned().collect());
        }
        let mut conversations = self.conversations.write().await;
        let turns = conversations.entry(conversation_id).or_default();
        Ok(turns.iter().cloned().collect())
    }

    async fn append(
        &self,
        conversation_id: i64,
        turn: Turn
    ) -> Result<Vec<Turn>, Box<dyn Error + Send + Sync>> {
        let mut conversations = self.conversations.write().await;
        let turns = conversations.entry(conversation_id).or_default();
        turns.push_back(turn);
        while turns.len() > self.window {
            turns.pop_front();
        }
        debug!("Conversation {} now holds {} turns", conversation_id, turns.len());
        Ok(turns.iter().cloned().collect())
    }

    async fn clear(&self, conversation_id: i64) -> Result<(), Box<dyn Error + Send + Sync>> {
        if let Some(turns) = self.conversations.write().await.get_mut(&conversation_id) {
            turns.clear();
        }
        Ok(())
    }

    fn window(&self) -> usize {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;

    #[tokio::test]
    async fn keeps_most_recent_turns_in_order() {
        let store = InMemoryHistoryStore::new(20);
        for n in 0..35 {
            store.append(1, Turn::user(format!("m{}", n))).await.unwrap();
        }
        let turns = store.get_or_create(1).await.unwrap();
        assert_eq!(turns.len(), 20);
        let expected: Vec<String> = (15..35).map(|n| format!("m{}", n)).collect();
        let actual: Vec<String> = turns.into_iter().map(|t| t.content).collect();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn length_is_min_of_appends_and_window() {
        for appended in [0usize, 1, 3, 4, 9] {
            let store = InMemoryHistoryStore::new(4);
            for n in 0..appended {
                store.append(5, Turn::user(n.to_string())).await.unwrap();
            }
            let turns = store.get_or_create(5).await.unwrap();
            assert_eq!(turns.len(), appended.min(4));
        }
    }

    #[tokio::test]
    async fn full_window_evicts_oldest_on_append() {
        let store = InMemoryHistoryStore::new(20);
        for n in 0..20 {
            store.append(9, Turn::user(format!("old{}", n))).await.unwrap();
        }
        let turns = store.append(9, Turn::assistant("newest")).await.unwrap();
        assert_eq!(turns.len(), 20);
        assert!(turns.iter().all(|t| t.content != "old0"));
        assert_eq!(turns.first().map(|t| t.content.as_str()), Some("old1"));
        assert_eq!(turns.last().map(|t| t.role), Some(Role::Assistant));
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = InMemoryHistoryStore::new(20);
        store.clear(77).await.unwrap();
        assert!(store.get_or_create(77).await.unwrap().is_empty());

        store.append(77, Turn::user("hi")).await.unwrap();
        store.clear(77).await.unwrap();
        store.clear(77).await.unwrap();
        assert!(store.get_or_create(77).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn conversations_are_isolated() {
        let store = InMemoryHistoryStore::new(20);
        store.append(1, Turn::user("a")).await.unwrap();
        store.append(2, Turn::user("b")).await.unwrap();
        store.clear(1).await.unwrap();
        assert!(store.get_or_create(1).await.unwrap().is_empty());
        assert_eq!(store.get_or_create(2).await.unwrap(), vec![Turn::user("b")]);
    }
}
