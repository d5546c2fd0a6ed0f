//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::{GraphProvider, GraphSettings};
use crate::error::{Result, TutorError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Talking to the graph requires a usable endpoint.
    Graph,
    /// The sales agent also requires an API key.
    Chat,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, graph: &GraphSettings) -> Result<()> {
    match operation {
        Operation::Graph => {
            check_graph_uri(graph)?;
        }
        Operation::Chat => {
            check_graph_uri(graph)?;
            check_api_key()?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(TutorError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(TutorError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check that the graph endpoint is an http(s) URL.
pub fn check_graph_uri(graph: &GraphSettings) -> Result<()> {
    if graph.provider == GraphProvider::Memory {
        return Ok(());
    }

    let url = url::Url::parse(&graph.uri)
        .map_err(|e| TutorError::Config(format!("GRAPH_URI '{}' is invalid: {}", graph.uri, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(TutorError::Config(format!(
            "GRAPH_URI must use http or https, got '{}'. Point it at the graph server's MCP endpoint.",
            scheme
        ))),
    }
}
