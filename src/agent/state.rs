//! Per-session conversation state.

use serde::{Deserialize, Serialize};

/// Who the agent is talking to, and the graph nodes its searches center on.
///
/// Only constructed once both nodes have been resolved in the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationState {
    pub user_name: String,
    /// Personal context is reranked around the shopper's node.
    pub user_node_uuid: String,
    /// Product lookups are reranked around the brand's node.
    pub brand_node_uuid: String,
}

impl ConversationState {
    pub fn new(user_name: &str, user_node_uuid: String, brand_node_uuid: String) -> Self {
        Self {
            user_name: user_name.to_string(),
            user_node_uuid,
            brand_node_uuid,
        }
    }
}
