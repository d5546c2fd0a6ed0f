//! Chat model abstraction for the sales agent.
//!
//! Conversation history is kept in a provider-neutral [`ChatMessage`] form so
//! it can be checkpointed and replayed; providers translate it on the way out.

mod openai;

pub use openai::OpenAIChatModel;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    /// JSON-encoded arguments, as produced by the model.
    pub arguments: String,
}

/// One message of conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(default)]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolInvocation>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        ChatMessage::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    /// Text content of the message (empty for a bare tool-call request).
    pub fn text(&self) -> &str {
        match self {
            ChatMessage::System { content }
            | ChatMessage::User { content }
            | ChatMessage::Tool { content, .. } => content,
            ChatMessage::Assistant { content, .. } => content.as_deref().unwrap_or(""),
        }
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, ChatMessage::Assistant { .. })
    }

    /// Tool calls carried by an assistant message.
    pub fn tool_calls(&self) -> &[ToolInvocation] {
        match self {
            ChatMessage::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

/// A function tool advertised to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

/// Trait for chat completion providers.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the next assistant message for the given history.
    ///
    /// The returned message is always [`ChatMessage::Assistant`].
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ChatMessage>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_serializes_with_roles() {
        let history = vec![
            ChatMessage::user("Do you have wide shoes?"),
            ChatMessage::Assistant {
                content: None,
                tool_calls: vec![ToolInvocation {
                    id: "call_1".to_string(),
                    name: "get_shoe_data".to_string(),
                    arguments: r#"{"query":"wide fit"}"#.to_string(),
                }],
            },
            ChatMessage::tool("call_1", "- Wool Runners come in wide sizes"),
            ChatMessage::assistant("Yes, the Wool Runners come in wide sizes."),
        ];

        let value = serde_json::to_value(&history).unwrap();
        assert_eq!(value[0], json!({"role": "user", "content": "Do you have wide shoes?"}));
        assert_eq!(value[1]["tool_calls"][0]["name"], "get_shoe_data");
        assert!(value[3].get("tool_calls").is_none());

        let back: Vec<ChatMessage> = serde_json::from_value(value).unwrap();
        assert_eq!(back, history);
    }

    #[test]
    fn test_text_and_tool_calls_accessors() {
        let request = ChatMessage::Assistant {
            content: None,
            tool_calls: vec![ToolInvocation {
                id: "c".to_string(),
                name: "get_shoe_data".to_string(),
                arguments: "{}".to_string(),
            }],
        };
        assert_eq!(request.text(), "");
        assert_eq!(request.tool_calls().len(), 1);
        assert!(ChatMessage::user("hi").tool_calls().is_empty());
        assert!(!ChatMessage::user("hi").is_assistant());
    }
}
