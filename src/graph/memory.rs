//! In-memory knowledge graph.
//!
//! Useful for testing and offline walkthroughs. It does no entity or fact
//! extraction: searches run over whatever edges and nodes it was seeded with,
//! matched by query terms. Every call is recorded so callers' arguments can
//! be inspected.

use super::{
    EdgeSearch, EntityEdge, EntityNode, EpisodeRecord, KnowledgeGraph, NewEpisode,
    NodeSearchConfig,
};
use crate::error::{Result, TutorError};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// A call received by [`MemoryGraph`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphCall {
    AddEpisode(NewEpisode),
    Search(EdgeSearch),
    SearchNodes {
        query: String,
        config: NodeSearchConfig,
    },
    Episodes(usize),
    Clear,
    Close,
}

#[derive(Default)]
struct State {
    edges: Vec<EntityEdge>,
    nodes: Vec<EntityNode>,
    episodes: Vec<EpisodeRecord>,
    calls: Vec<GraphCall>,
}

/// In-memory knowledge graph.
#[derive(Default)]
pub struct MemoryGraph {
    state: Mutex<State>,
    fail_episodes: bool,
}

impl MemoryGraph {
    /// Create an empty in-memory graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed facts returned by `search`.
    pub fn with_edges(self, edges: Vec<EntityEdge>) -> Self {
        self.lock_state_unchecked().edges = edges;
        self
    }

    /// Seed entities returned by `search_nodes`.
    pub fn with_nodes(self, nodes: Vec<EntityNode>) -> Self {
        self.lock_state_unchecked().nodes = nodes;
        self
    }

    /// Make every `add_episode` call fail.
    pub fn fail_episodes(mut self) -> Self {
        self.fail_episodes = true;
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<GraphCall> {
        self.lock_state_unchecked().calls.clone()
    }

    /// Episodes ingested so far, oldest first.
    pub fn ingested(&self) -> Vec<EpisodeRecord> {
        self.lock_state_unchecked().episodes.clone()
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|e| TutorError::Graph(format!("Failed to acquire lock: {}", e)))
    }

    fn lock_state_unchecked(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Lowercased query terms.
fn terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(str::to_lowercase)
        .collect()
}

/// How many query terms occur as words in `text`.
fn overlap(query_terms: &[String], text: &str) -> usize {
    let words = terms(text);
    query_terms.iter().filter(|t| words.contains(t)).count()
}

#[async_trait]
impl KnowledgeGraph for MemoryGraph {
    async fn add_episode(&self, episode: &NewEpisode) -> Result<()> {
        let mut state = self.lock_state()?;
        state.calls.push(GraphCall::AddEpisode(episode.clone()));

        if self.fail_episodes {
            return Err(TutorError::Graph(format!(
                "Episode '{}' rejected",
                episode.name
            )));
        }

        state.episodes.push(EpisodeRecord {
            uuid: Uuid::new_v4().to_string(),
            name: episode.name.clone(),
            content: episode.body.clone(),
            source: Some(episode.source.to_string()),
            source_description: episode.source_description.clone(),
            created_at: Some(episode.reference_time),
        });
        Ok(())
    }

    async fn search(&self, search: &EdgeSearch) -> Result<Vec<EntityEdge>> {
        let mut state = self.lock_state()?;
        state.calls.push(GraphCall::Search(search.clone()));

        let terms = terms(&search.query);
        let mut scored: Vec<(usize, bool, &EntityEdge)> = state
            .edges
            .iter()
            .map(|edge| {
                let near = search.center_node_uuid.as_ref().is_some_and(|c| {
                    edge.source_node_uuid.as_ref() == Some(c)
                        || edge.target_node_uuid.as_ref() == Some(c)
                });
                (overlap(&terms, &edge.fact), near, edge)
            })
            .filter(|(score, _, _)| *score > 0)
            .collect();

        // Edges touching the center node first, then by term overlap.
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));

        Ok(scored
            .into_iter()
            .take(search.num_results)
            .map(|(_, _, edge)| edge.clone())
            .collect())
    }

    async fn search_nodes(
        &self,
        query: &str,
        config: &NodeSearchConfig,
    ) -> Result<Vec<EntityNode>> {
        let mut state = self.lock_state()?;
        state.calls.push(GraphCall::SearchNodes {
            query: query.to_string(),
            config: config.clone(),
        });

        let terms = terms(query);
        let mut scored: Vec<(usize, &EntityNode)> = state
            .nodes
            .iter()
            .map(|node| (overlap(&terms, &format!("{} {}", node.name, node.summary)), node))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(config.limit)
            .map(|(_, node)| node.clone())
            .collect())
    }

    async fn episodes(&self, last_n: usize) -> Result<Vec<EpisodeRecord>> {
        let mut state = self.lock_state()?;
        state.calls.push(GraphCall::Episodes(last_n));
        Ok(state.episodes.iter().rev().take(last_n).cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        state.calls.push(GraphCall::Clear);
        state.edges.clear();
        state.nodes.clear();
        state.episodes.clear();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.lock_state()?.calls.push(GraphCall::Close);
        Ok(())
    }
}
