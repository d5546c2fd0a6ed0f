//! CLI module for graphiti-tutor.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand, ValueEnum};

/// graphiti-tutor - Temporal knowledge graph walkthroughs
///
/// Feeds episodes into a graphiti graph server, searches the facts and
/// entities it extracts, and runs a sales chatbot that remembers its
/// conversations in the graph.
#[derive(Parser, Debug)]
#[command(name = "graphiti-tutor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest sample episodes, then run edge, reranked, and node searches
    Quickstart {
        /// Search the existing graph without adding the sample episodes
        #[arg(long)]
        skip_ingest: bool,
    },

    /// Chat with a shoe sales agent backed by the graph
    Salesbot {
        /// Wipe the graph and ingest the product catalog without asking
        #[arg(long, conflicts_with = "no_setup")]
        setup: bool,

        /// Reuse existing graph data without asking
        #[arg(long)]
        no_setup: bool,

        /// Chat model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Search facts (edges) in the graph
    Search {
        /// Search query
        query: String,

        /// Rerank results by graph distance from this node
        #[arg(long)]
        center: Option<String>,

        /// Maximum number of results
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Search entities (nodes) in the graph
    Nodes {
        /// Search query
        query: String,

        /// Search recipe
        #[arg(short, long, value_enum, default_value = "rrf")]
        recipe: RecipeArg,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Show the most recent episodes
    Episodes {
        /// Number of episodes to show
        #[arg(short = 'n', long, default_value = "10")]
        last: usize,
    },

    /// Delete all data from the graph
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Check configuration and connectivity
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Node search recipes selectable from the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeArg {
    /// Hybrid search with reciprocal rank fusion
    Rrf,
    /// Hybrid search reranked by episode mentions
    Mentions,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
