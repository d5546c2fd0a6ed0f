//! Clear command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::graph::open_graph;
use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Delete all graph data, after confirmation unless `yes` is set.
pub async fn run_clear(yes: bool, settings: &Settings) -> Result<()> {
    preflight::check(Operation::Graph, &settings.graph)?;

    if !yes {
        print!(
            "This will delete all data in the graph at {}. Continue? (yes/no) ",
            settings.graph.uri
        );
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("yes") {
            Output::info("Aborted.");
            return Ok(());
        }
    }

    let graph = open_graph(&settings.graph)?;
    let cleared = graph.clear().await;
    graph.close().await?;
    cleared?;

    Output::success("Graph cleared.");
    Ok(())
}
