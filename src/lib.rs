//! graphiti-tutor - Temporal knowledge graph walkthroughs
//!
//! A CLI and library for getting to know a graphiti knowledge graph: feed it
//! episodes, search the facts and entities it extracts, and build a
//! conversational agent that keeps its memory in the graph.
//!
//! # Overview
//!
//! graphiti-tutor allows you to:
//! - Ingest text and JSON episodes into a graph server
//! - Run hybrid fact searches, optionally reranked around a center node
//! - Search entities with node search recipes
//! - Chat with a shoe sales agent that stores every turn back in the graph
//!
//! # Architecture
//!
//! - `config` - Configuration management and prompt templates
//! - `graph` - Knowledge graph abstraction (MCP server, in-memory)
//! - `llm` - Chat model abstraction (OpenAI)
//! - `checkpoint` - Per-thread conversation history
//! - `agent` - The sales agent loop, its tool, and background persistence
//! - `quickstart` - Beginner walkthrough
//! - `sales` - Graph setup for the sales agent
//!
//! # Example
//!
//! ```rust,no_run
//! use graphiti_tutor::config::Settings;
//! use graphiti_tutor::graph::{open_graph, EdgeSearch};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let graph = open_graph(&settings.graph)?;
//!
//!     let facts = graph
//!         .search(&EdgeSearch::new("Who was the California Attorney General?"))
//!         .await?;
//!     for fact in &facts {
//!         println!("{}", fact.fact);
//!     }
//!
//!     graph.close().await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod llm;
pub mod openai;
pub mod quickstart;
pub mod sales;

pub use error::{Result, TutorError};
