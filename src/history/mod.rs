mod memory;

pub use memory::InMemoryHistoryStore;

use async_trait::async_trait;
use log::info;
use std::error::Error;
use crate::cli::Args;
use std::sync::Arc;
use crate::models::chat::Turn;

pub const DEFAULT_HISTORY_WINDOW: usize = 20;

/// Per-conversation turn storage with a fixed retention window.
///
/// Every call is atomic on its own, but nothing ties a read to a later
/// append: two updates for the same chat may interleave their appends
/// between the provider call and the write-back.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Returns the current turns, creating an empty conversation if needed.
    async fn get_or_create(
        &self,
        conversation_id: i64
    ) -> Result<Vec<Turn>, Box<dyn Error + Send + Sync>>;

    /// Appends a turn, evicts the oldest turns beyond the window and returns
    /// the resulting sequence.
    async fn append(
        &self,
        conversation_id: i64,
        turn: Turn
    ) -> Result<Vec<Turn>, Box<dyn Error + Send + Sync>>;

    async fn clear(&self, conversation_id: i64) -> Result<(), Box<dyn Error + Send + Sync>>;

    fn window(&self) -> usize;
}

pub fn create_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    if args.history_window == 0 {
        return Err("HISTORY_WINDOW must be at least 1".into());
    }
    match args.history_type.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(InMemoryHistoryStore::new(args.history_window))),
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported history store type: {}", args.history_type)
                    )
                )
            ),
    }
}

pub fn initialize_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    let store = create_history_store(args)?;
    info!(
        "Chat history will be stored in: {} (window = {} turns)",
        args.history_type,
        store.window()
    );
    Ok(store)
}
