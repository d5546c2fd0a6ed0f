//! Knowledge graph client abstraction.
//!
//! Episode ingestion, fact (edge) search, and node search are performed by an
//! external temporal knowledge graph service. This module defines the types
//! exchanged with it and a trait-based interface over the transports.

mod mcp;
mod memory;
pub mod protocol;

pub use mcp::McpGraph;
pub use memory::{GraphCall, MemoryGraph};

use crate::config::{GraphProvider, GraphSettings};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Default number of facts returned by an edge search.
pub const DEFAULT_NUM_RESULTS: usize = 10;

/// Kind of content carried by an episode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeType {
    /// Free-form prose.
    Text,
    /// A serialized JSON document.
    Json,
    /// Conversation turns in `speaker: content` form.
    Message,
}

impl std::fmt::Display for EpisodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EpisodeType::Text => write!(f, "text"),
            EpisodeType::Json => write!(f, "json"),
            EpisodeType::Message => write!(f, "message"),
        }
    }
}

/// An episode to be ingested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEpisode {
    pub name: String,
    pub body: String,
    pub source: EpisodeType,
    pub source_description: String,
    pub reference_time: DateTime<Utc>,
}

impl NewEpisode {
    /// Create an episode stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        body: impl Into<String>,
        source: EpisodeType,
        source_description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            source,
            source_description: source_description.into(),
            reference_time: Utc::now(),
        }
    }
}

/// A fact connecting two entities, with its validity interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityEdge {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    pub fact: String,
    #[serde(default)]
    pub source_node_uuid: Option<String>,
    #[serde(default)]
    pub target_node_uuid: Option<String>,
    /// When the fact became true.
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub valid_at: Option<DateTime<Utc>>,
    /// When the fact stopped being true.
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub invalid_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub expired_at: Option<DateTime<Utc>>,
}

/// An entity in the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityNode {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// A stored episode as reported back by the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeRecord {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub source_description: String,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Parameters for a fact search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeSearch {
    pub query: String,
    /// Rerank results by graph distance from this node.
    pub center_node_uuid: Option<String>,
    pub num_results: usize,
}

impl EdgeSearch {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            center_node_uuid: None,
            num_results: DEFAULT_NUM_RESULTS,
        }
    }

    pub fn with_center(mut self, center_node_uuid: impl Into<String>) -> Self {
        self.center_node_uuid = Some(center_node_uuid.into());
        self
    }

    pub fn with_num_results(mut self, num_results: usize) -> Self {
        self.num_results = num_results;
        self
    }
}

/// Reranking strategy for node search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "reranker", rename_all = "snake_case")]
pub enum NodeRecipe {
    /// Hybrid BM25 + embedding search fused with reciprocal rank fusion.
    HybridRrf,
    /// Hybrid search reranked by how often episodes mention each node.
    EpisodeMentions,
    /// Hybrid search reranked by graph distance from a center node.
    NodeDistance { center_node_uuid: String },
}

impl std::fmt::Display for NodeRecipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeRecipe::HybridRrf => write!(f, "NODE_HYBRID_SEARCH_RRF"),
            NodeRecipe::EpisodeMentions => write!(f, "NODE_HYBRID_SEARCH_EPISODE_MENTIONS"),
            NodeRecipe::NodeDistance { .. } => write!(f, "NODE_HYBRID_SEARCH_NODE_DISTANCE"),
        }
    }
}

/// A node search recipe plus its result limit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSearchConfig {
    pub recipe: NodeRecipe,
    pub limit: usize,
}

impl NodeSearchConfig {
    pub fn hybrid_rrf() -> Self {
        Self {
            recipe: NodeRecipe::HybridRrf,
            limit: DEFAULT_NUM_RESULTS,
        }
    }

    pub fn episode_mentions() -> Self {
        Self {
            recipe: NodeRecipe::EpisodeMentions,
            limit: DEFAULT_NUM_RESULTS,
        }
    }

    pub fn node_distance(center_node_uuid: impl Into<String>) -> Self {
        Self {
            recipe: NodeRecipe::NodeDistance {
                center_node_uuid: center_node_uuid.into(),
            },
            limit: DEFAULT_NUM_RESULTS,
        }
    }

    /// Copy of this recipe with a different limit.
    pub fn with_limit(&self, limit: usize) -> Self {
        Self {
            recipe: self.recipe.clone(),
            limit,
        }
    }

    /// Center node implied by the recipe, if any.
    pub fn center_node_uuid(&self) -> Option<&str> {
        match &self.recipe {
            NodeRecipe::NodeDistance { center_node_uuid } => Some(center_node_uuid),
            _ => None,
        }
    }
}

/// Trait for knowledge graph backends.
#[async_trait]
pub trait KnowledgeGraph: Send + Sync {
    /// Ingest an episode. Entity and fact extraction happens on the graph side.
    async fn add_episode(&self, episode: &NewEpisode) -> Result<()>;

    /// Hybrid fact search, optionally reranked around a center node.
    async fn search(&self, search: &EdgeSearch) -> Result<Vec<EntityEdge>>;

    /// Node search using a recipe.
    async fn search_nodes(&self, query: &str, config: &NodeSearchConfig)
        -> Result<Vec<EntityNode>>;

    /// Most recent episodes, newest first.
    async fn episodes(&self, last_n: usize) -> Result<Vec<EpisodeRecord>>;

    /// Remove all data and rebuild indices and constraints.
    async fn clear(&self) -> Result<()>;

    /// Release the connection. Further calls reconnect.
    async fn close(&self) -> Result<()>;
}

/// Open the graph backend selected in settings.
pub fn open_graph(settings: &GraphSettings) -> Result<Arc<dyn KnowledgeGraph>> {
    match settings.provider {
        GraphProvider::Mcp => Ok(Arc::new(McpGraph::new(settings)?)),
        GraphProvider::Memory => Ok(Arc::new(MemoryGraph::new())),
    }
}

/// Render facts as a bulleted list, one `- fact` per line.
///
/// Returns `None` when there is nothing to render.
pub fn facts_block(edges: &[EntityEdge]) -> Option<String> {
    if edges.is_empty() {
        return None;
    }
    Some(
        edges
            .iter()
            .map(|edge| format!("- {}", edge.fact))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// Accept RFC 3339 timestamps as well as naive ones (taken as UTC).
fn lenient_datetime<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| parse_timestamp(&s)))
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}
