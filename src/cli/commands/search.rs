//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::graph::{open_graph, EdgeSearch};
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    center: Option<String>,
    limit: usize,
    settings: &Settings,
) -> Result<()> {
    preflight::check(Operation::Graph, &settings.graph)?;

    let graph = open_graph(&settings.graph)?;
    let mut search = EdgeSearch::new(query).with_num_results(limit);
    if let Some(center) = center {
        search = search.with_center(center);
    }

    let spinner = Output::spinner("Searching...");
    let results = graph.search(&search).await;
    spinner.finish_and_clear();
    graph.close().await?;

    match results {
        Ok(edges) if edges.is_empty() => {
            Output::warning("No facts found matching your query.");
        }
        Ok(edges) => {
            Output::success(&format!("Found {} facts", edges.len()));
            for edge in &edges {
                Output::fact(edge);
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
