//! Conversation checkpoints.
//!
//! Each chat session is a thread identified by an opaque id. The agent loads
//! the thread's history before a turn and saves it afterwards.

mod memory;
mod sqlite;

pub use memory::MemoryCheckpointer;
pub use sqlite::SqliteCheckpointer;

use crate::config::{CheckpointProvider, Settings};
use crate::error::Result;
use crate::llm::ChatMessage;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for conversation history stores.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// History of a thread; empty for an unknown thread.
    async fn load(&self, thread_id: &str) -> Result<Vec<ChatMessage>>;

    /// Replace the stored history of a thread.
    async fn save(&self, thread_id: &str, messages: &[ChatMessage]) -> Result<()>;
}

/// Open the checkpointer selected in settings.
pub fn open_checkpointer(settings: &Settings) -> Result<Arc<dyn Checkpointer>> {
    match settings.checkpoint.provider {
        CheckpointProvider::Memory => Ok(Arc::new(MemoryCheckpointer::new())),
        CheckpointProvider::Sqlite => Ok(Arc::new(SqliteCheckpointer::new(
            &settings.checkpoint_path(),
        )?)),
    }
}
