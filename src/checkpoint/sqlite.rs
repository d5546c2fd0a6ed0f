//! SQLite-backed checkpointer.
//!
//! Stores each thread's history as a JSON array, so a conversation can be
//! resumed across runs by reusing its thread id.

use super::Checkpointer;
use crate::error::{Result, TutorError};
use crate::llm::ChatMessage;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS checkpoints (
    thread_id TEXT PRIMARY KEY,
    messages_json TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// SQLite conversation store.
pub struct SqliteCheckpointer {
    conn: Mutex<Connection>,
}

impl SqliteCheckpointer {
    /// Open (or create) a checkpoint database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized checkpoint store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory checkpoint database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TutorError::Agent(format!("Failed to acquire lock: {}", e)))
    }
}

#[async_trait]
impl Checkpointer for SqliteCheckpointer {
    async fn load(&self, thread_id: &str) -> Result<Vec<ChatMessage>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT messages_json FROM checkpoints WHERE thread_id = ?1",
                params![thread_id],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, thread_id: &str, messages: &[ChatMessage]) -> Result<()> {
        let json = serde_json::to_string(messages)?;
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO checkpoints (thread_id, messages_json, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(thread_id) DO UPDATE SET
                messages_json = excluded.messages_json,
                updated_at = excluded.updated_at
            "#,
            params![thread_id, json, Utc::now().to_rfc3339()],
        )?;
        debug!("Saved {} message(s) for thread {}", messages.len(), thread_id);
        Ok(())
    }
}
