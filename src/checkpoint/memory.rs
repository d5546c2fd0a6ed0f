//! In-memory checkpointer. History lives as long as the process.

use super::Checkpointer;
use crate::error::{Result, TutorError};
use crate::llm::ChatMessage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory conversation store.
pub struct MemoryCheckpointer {
    threads: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCheckpointer {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned(e: impl std::fmt::Display) -> TutorError {
    TutorError::Agent(format!("Checkpoint lock poisoned: {}", e))
}

#[async_trait]
impl Checkpointer for MemoryCheckpointer {
    async fn load(&self, thread_id: &str) -> Result<Vec<ChatMessage>> {
        let threads = self.threads.read().map_err(poisoned)?;
        Ok(threads.get(thread_id).cloned().unwrap_or_default())
    }

    async fn save(&self, thread_id: &str, messages: &[ChatMessage]) -> Result<()> {
        let mut threads = self.threads.write().map_err(poisoned)?;
        threads.insert(thread_id.to_string(), messages.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threads_are_isolated() {
        tokio_test::block_on(async {
            let store = MemoryCheckpointer::new();
            store
                .save("a", &[ChatMessage::user("size 8 please")])
                .await
                .unwrap();

            assert_eq!(store.load("a").await.unwrap().len(), 1);
            assert!(store.load("b").await.unwrap().is_empty());
        });
    }
}
