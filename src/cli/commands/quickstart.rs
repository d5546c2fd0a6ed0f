//! Quickstart command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::graph::open_graph;
use crate::quickstart::{self, QuickstartOptions};
use anyhow::Result;

/// Run the beginner walkthrough against the configured graph.
pub async fn run_quickstart(skip_ingest: bool, settings: &Settings) -> Result<()> {
    preflight::check(Operation::Graph, &settings.graph)?;

    let graph = open_graph(&settings.graph)?;
    let mut stdout = std::io::stdout();
    let report = quickstart::run(graph.as_ref(), QuickstartOptions { skip_ingest }, &mut stdout).await;

    match report {
        Ok(report) => {
            if report.facts == 0 && skip_ingest {
                Output::warning("The graph returned no facts. Run without --skip-ingest to add the sample episodes.");
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Quickstart failed: {}", e));
            Err(e.into())
        }
    }
}
