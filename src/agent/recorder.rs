//! Background persistence of conversation turns.
//!
//! Writing a turn back to the graph is slow (the graph extracts entities and
//! facts from it), so it runs off the chat loop. Every write is tracked in a
//! [`JoinSet`]: finished writes are collected between turns, failures are
//! logged and counted, and [`TurnRecorder::drain`] waits for stragglers
//! before the connection is closed.

use crate::error::Result;
use crate::graph::{KnowledgeGraph, NewEpisode};
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

/// Outcome counts for background writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecorderSummary {
    pub recorded: usize,
    pub failed: usize,
}

/// Tracks episode writes spawned in the background.
pub struct TurnRecorder {
    graph: Arc<dyn KnowledgeGraph>,
    tasks: JoinSet<Result<String>>,
    summary: RecorderSummary,
}

impl TurnRecorder {
    pub fn new(graph: Arc<dyn KnowledgeGraph>) -> Self {
        Self {
            graph,
            tasks: JoinSet::new(),
            summary: RecorderSummary::default(),
        }
    }

    /// Spawn a write of `episode`. Must be called within a Tokio runtime.
    pub fn record(&mut self, episode: NewEpisode) {
        let graph = self.graph.clone();
        self.tasks.spawn(async move {
            graph.add_episode(&episode).await?;
            Ok(episode.name)
        });
    }

    /// Writes still in flight.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Account for writes that have already finished, without waiting.
    pub fn reap(&mut self) -> RecorderSummary {
        while let Some(outcome) = self.tasks.try_join_next() {
            self.account(outcome);
        }
        self.summary
    }

    /// Wait for every outstanding write and return the totals.
    pub async fn drain(&mut self) -> RecorderSummary {
        while let Some(outcome) = self.tasks.join_next().await {
            self.account(outcome);
        }
        self.summary
    }

    fn account(&mut self, outcome: std::result::Result<Result<String>, JoinError>) {
        match outcome {
            Ok(Ok(name)) => {
                self.summary.recorded += 1;
                debug!("Persisted episode '{}'", name);
            }
            Ok(Err(e)) => {
                self.summary.failed += 1;
                warn!("Failed to persist conversation turn: {}", e);
            }
            Err(e) => {
                self.summary.failed += 1;
                warn!("Conversation turn writer did not finish: {}", e);
            }
        }
    }
}
