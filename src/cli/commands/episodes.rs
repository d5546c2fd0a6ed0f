//! Episodes command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::graph::open_graph;
use anyhow::Result;

/// List the most recent episodes.
pub async fn run_episodes(last: usize, settings: &Settings) -> Result<()> {
    preflight::check(Operation::Graph, &settings.graph)?;

    let graph = open_graph(&settings.graph)?;
    let episodes = graph.episodes(last).await;
    graph.close().await?;
    let episodes = episodes?;

    if episodes.is_empty() {
        Output::info("No episodes yet. Run 'graphiti-tutor quickstart' to add some.");
        return Ok(());
    }

    Output::header(&format!("Last {} episode(s)", episodes.len()));
    for episode in &episodes {
        Output::episode(episode);
    }

    Ok(())
}
