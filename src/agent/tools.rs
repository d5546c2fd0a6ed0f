//! Tool definitions and implementations for the sales agent.

use crate::error::{Result, TutorError};
use crate::graph::{facts_block, EdgeSearch, KnowledgeGraph};
use crate::llm::ToolSpec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Name under which the product lookup is advertised to the model.
pub const GET_SHOE_DATA: &str = "get_shoe_data";

/// Available tools for the agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Search the graph for facts about shoes and related products.
    GetShoeData { query: String },
}

/// Tool execution context with access to the knowledge graph.
pub struct ToolContext {
    graph: Arc<dyn KnowledgeGraph>,
    /// Product searches are reranked around this node.
    brand_node_uuid: String,
    num_results: usize,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(graph: Arc<dyn KnowledgeGraph>, brand_node_uuid: &str, num_results: usize) -> Self {
        Self {
            graph,
            brand_node_uuid: brand_node_uuid.to_string(),
            num_results,
        }
    }

    /// Execute a tool call and return the result as a string.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        match tool {
            ToolCall::GetShoeData { query } => self.execute_get_shoe_data(query).await,
        }
    }

    async fn execute_get_shoe_data(&self, query: &str) -> Result<String> {
        info!("Tool `{}` called with query: {}", GET_SHOE_DATA, query);
        let search = EdgeSearch::new(query)
            .with_center(self.brand_node_uuid.as_str())
            .with_num_results(self.num_results);
        let edges = self.graph.search(&search).await?;

        Ok(facts_block(&edges).unwrap_or_else(|| "No relevant facts found.".to_string()))
    }
}

/// Function tool definitions advertised to the model.
pub fn tool_definitions() -> Vec<ToolSpec> {
    vec![ToolSpec {
        name: GET_SHOE_DATA.to_string(),
        description: "Search the graph for information about shoes and related products."
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look up, e.g. 'wide fit running shoes'"
                }
            },
            "required": ["query"]
        }),
    }]
}

/// Parse a tool call from the model's name and JSON arguments.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| TutorError::Agent(format!("Invalid tool arguments: {}", e)))?;

    match name {
        GET_SHOE_DATA => {
            let query = args["query"]
                .as_str()
                .ok_or_else(|| TutorError::Agent("Missing 'query' argument".to_string()))?
                .to_string();
            Ok(ToolCall::GetShoeData { query })
        }
        _ => Err(TutorError::Agent(format!("Unknown tool: {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EntityEdge, GraphCall, MemoryGraph};

    fn fact(fact: &str) -> EntityEdge {
        EntityEdge {
            uuid: format!("edge-{}", fact.len()),
            name: "HAS_FEATURE".to_string(),
            fact: fact.to_string(),
            source_node_uuid: Some("brand".to_string()),
            target_node_uuid: None,
            valid_at: None,
            invalid_at: None,
            created_at: None,
            expired_at: None,
        }
    }

    #[test]
    fn test_parse_get_shoe_data() {
        let tool = parse_tool_call(GET_SHOE_DATA, r#"{"query": "wool runners"}"#).unwrap();
        assert_eq!(
            tool,
            ToolCall::GetShoeData {
                query: "wool runners".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_malformed() {
        assert!(parse_tool_call("get_weather", r#"{"query": "x"}"#).is_err());
        assert!(parse_tool_call(GET_SHOE_DATA, r#"{"q": "x"}"#).is_err());
        assert!(parse_tool_call(GET_SHOE_DATA, "not json").is_err());
    }

    #[tokio::test]
    async fn test_search_is_centered_on_brand() {
        let graph = Arc::new(MemoryGraph::new().with_edges(vec![
            fact("Wool Runners are made from merino wool"),
            fact("Tree Runners are made from eucalyptus fiber"),
        ]));
        let tools = ToolContext::new(graph.clone(), "brand-uuid", 10);

        let output = tools
            .execute(&ToolCall::GetShoeData {
                query: "wool runners".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            output,
            "- Wool Runners are made from merino wool\n- Tree Runners are made from eucalyptus fiber"
        );
        assert_eq!(
            graph.calls(),
            vec![GraphCall::Search(
                EdgeSearch::new("wool runners")
                    .with_center("brand-uuid")
                    .with_num_results(10)
            )]
        );
    }

    #[tokio::test]
    async fn test_no_results_message() {
        let tools = ToolContext::new(Arc::new(MemoryGraph::new()), "brand-uuid", 10);
        let output = tools
            .execute(&ToolCall::GetShoeData {
                query: "boots".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(output, "No relevant facts found.");
    }
}
