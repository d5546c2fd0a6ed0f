//! Node search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, RecipeArg};
use crate::config::Settings;
use crate::graph::{open_graph, NodeSearchConfig};
use anyhow::Result;

/// Run the node search command.
pub async fn run_nodes(
    query: &str,
    recipe: RecipeArg,
    limit: usize,
    settings: &Settings,
) -> Result<()> {
    preflight::check(Operation::Graph, &settings.graph)?;

    let config = match recipe {
        RecipeArg::Rrf => NodeSearchConfig::hybrid_rrf(),
        RecipeArg::Mentions => NodeSearchConfig::episode_mentions(),
    }
    .with_limit(limit);

    let graph = open_graph(&settings.graph)?;
    let spinner = Output::spinner(&format!("Searching nodes ({})...", config.recipe));
    let results = graph.search_nodes(query, &config).await;
    spinner.finish_and_clear();
    graph.close().await?;

    let nodes = results?;
    if nodes.is_empty() {
        Output::warning("No nodes found matching your query.");
    } else {
        Output::success(&format!("Found {} nodes", nodes.len()));
        for node in &nodes {
            Output::node(node);
        }
    }

    Ok(())
}
