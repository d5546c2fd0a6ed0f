//! Beginner walkthrough: ingest a few episodes, then search them.
//!
//! Steps:
//! 1. add four sample episodes (two text, two JSON)
//! 2. edge search for a question
//! 3. the same search reranked around the top result's source node
//! 4. node search with the hybrid RRF recipe
//!
//! The graph connection is closed on every path, including failures.

use crate::error::Result;
use crate::graph::{
    EdgeSearch, EntityEdge, EntityNode, EpisodeType, KnowledgeGraph, NewEpisode, NodeSearchConfig,
};
use serde_json::json;
use std::io::Write;
use tracing::{info, warn};

/// Question used for both edge searches.
pub const EDGE_QUERY: &str = "Who was the California Attorney General?";

/// Query for the node search.
pub const NODE_QUERY: &str = "California Governor";

/// Nodes returned by the node search.
pub const NODE_LIMIT: usize = 5;

/// Node summaries longer than this are cut short when printed.
const SUMMARY_PREVIEW: usize = 100;

/// Walkthrough options.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickstartOptions {
    /// Search what is already in the graph instead of adding the samples.
    pub skip_ingest: bool,
}

/// What the walkthrough did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuickstartReport {
    pub episodes_added: usize,
    pub facts: usize,
    /// Node the second search was reranked around, if any.
    pub center_node_uuid: Option<String>,
    pub reranked_facts: usize,
    pub nodes: usize,
}

/// The four sample episodes, named `Freakonomics Radio {i}`.
pub fn sample_episodes() -> Vec<NewEpisode> {
    let bodies = [
        (
            "Kamala Harris is the Attorney General of California. She was previously \
             the district attorney for San Francisco."
                .to_string(),
            EpisodeType::Text,
            "podcast transcript",
        ),
        (
            "As AG, Harris was in office from January 3, 2011 – January 3, 2017".to_string(),
            EpisodeType::Text,
            "podcast transcript",
        ),
        (
            json!({
                "name": "Gavin Newsom",
                "position": "Governor",
                "state": "California",
                "previous_role": "Lieutenant Governor",
                "previous_location": "San Francisco",
            })
            .to_string(),
            EpisodeType::Json,
            "podcast metadata",
        ),
        (
            json!({
                "name": "Gavin Newsom",
                "position": "Governor",
                "term_start": "January 7, 2019",
                "term_end": "Present",
            })
            .to_string(),
            EpisodeType::Json,
            "podcast metadata",
        ),
    ];

    bodies
        .into_iter()
        .enumerate()
        .map(|(i, (body, source, description))| {
            NewEpisode::new(format!("Freakonomics Radio {}", i), body, source, description)
        })
        .collect()
}

/// Run the walkthrough, writing its transcript to `out`, then close `graph`.
///
/// A failure in any step still closes the connection; the step's error is
/// returned after "Connection closed" is printed.
pub async fn run<W: Write + Send>(
    graph: &dyn KnowledgeGraph,
    options: QuickstartOptions,
    out: &mut W,
) -> Result<QuickstartReport> {
    let outcome = walkthrough(graph, options, out).await;

    let closed = graph.close().await;
    writeln!(out, "\nConnection closed")?;

    let report = outcome?;
    closed?;
    Ok(report)
}

async fn walkthrough<W: Write + Send>(
    graph: &dyn KnowledgeGraph,
    options: QuickstartOptions,
    out: &mut W,
) -> Result<QuickstartReport> {
    let mut report = QuickstartReport::default();

    if options.skip_ingest {
        info!("Skipping sample ingestion");
    } else {
        for episode in sample_episodes() {
            graph.add_episode(&episode).await?;
            writeln!(out, "Added episode: {} ({})", episode.name, episode.source)?;
            report.episodes_added += 1;
        }
    }

    writeln!(out, "\nSearching for: '{}'", EDGE_QUERY)?;
    let results = graph.search(&EdgeSearch::new(EDGE_QUERY)).await?;
    report.facts = results.len();

    writeln!(out, "\nSearch Results:")?;
    for edge in &results {
        write!(out, "{}", format_fact(edge))?;
    }

    match results.first().map(|edge| edge.source_node_uuid.as_deref()) {
        Some(Some(center)) => {
            writeln!(out, "\nReranking search results based on graph distance:")?;
            writeln!(out, "Using center node UUID: {}", center)?;

            let reranked = graph
                .search(&EdgeSearch::new(EDGE_QUERY).with_center(center))
                .await?;
            report.center_node_uuid = Some(center.to_string());
            report.reranked_facts = reranked.len();

            writeln!(out, "\nReranked Search Results:")?;
            for edge in &reranked {
                write!(out, "{}", format_fact(edge))?;
            }
        }
        Some(None) => {
            warn!("Top search result has no source node");
            writeln!(
                out,
                "The top result has no source node to use as center node."
            )?;
        }
        None => {
            writeln!(
                out,
                "No results found in the initial search to use as center node."
            )?;
        }
    }

    let config = NodeSearchConfig::hybrid_rrf().with_limit(NODE_LIMIT);
    writeln!(
        out,
        "\nPerforming node search with recipe {}:",
        config.recipe
    )?;
    let nodes = graph.search_nodes(NODE_QUERY, &config).await?;
    report.nodes = nodes.len();

    writeln!(out, "\nNode Search Results:")?;
    for node in &nodes {
        write!(out, "{}", format_node(node))?;
    }

    Ok(report)
}

/// Printable block for a fact, ending with a `---` separator.
pub fn format_fact(edge: &EntityEdge) -> String {
    let mut block = format!("UUID: {}\nFact: {}\n", edge.uuid, edge.fact);
    if let Some(valid_at) = edge.valid_at {
        block.push_str(&format!("Valid from: {}\n", valid_at));
    }
    if let Some(invalid_at) = edge.invalid_at {
        block.push_str(&format!("Valid until: {}\n", invalid_at));
    }
    block.push_str("---\n");
    block
}

/// Printable block for a node, ending with a `---` separator.
pub fn format_node(node: &EntityNode) -> String {
    let created_at = node
        .created_at
        .map(|t| t.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut block = format!(
        "Node UUID: {}\nNode Name: {}\nContent Summary: {}\nNode Labels: {}\nCreated At: {}\n",
        node.uuid,
        node.name,
        summary_preview(&node.summary),
        node.labels.join(", "),
        created_at
    );
    if !node.attributes.is_empty() {
        block.push_str("Attributes:\n");
        for (key, value) in &node.attributes {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            block.push_str(&format!("  {}: {}\n", key, value));
        }
    }
    block.push_str("---\n");
    block
}

/// First 100 characters of a summary, with "..." when cut.
pub fn summary_preview(summary: &str) -> String {
    if summary.chars().count() > SUMMARY_PREVIEW {
        let cut: String = summary.chars().take(SUMMARY_PREVIEW).collect();
        format!("{}...", cut)
    } else {
        summary.to_string()
    }
}
