//! OpenAI chat completions implementation.

use super::{ChatMessage, ChatModel, ToolInvocation, ToolSpec};
use crate::error::{Result, TutorError};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI-backed chat model.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    /// Create a chat model with the given model name, temperature, and request timeout.
    pub fn new(model: &str, temperature: f32, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout)?,
            model: model.to_string(),
            temperature,
        })
    }
}

fn build_err(e: impl std::fmt::Display) -> TutorError {
    TutorError::Agent(e.to_string())
}

/// Translate history into request messages.
fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let built: ChatCompletionRequestMessage = match message {
        ChatMessage::System { content } => ChatCompletionRequestSystemMessageArgs::default()
            .content(content.as_str())
            .build()
            .map_err(build_err)?
            .into(),
        ChatMessage::User { content } => ChatCompletionRequestUserMessageArgs::default()
            .content(content.as_str())
            .build()
            .map_err(build_err)?
            .into(),
        ChatMessage::Assistant {
            content,
            tool_calls,
        } => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if let Some(content) = content {
                args.content(content.as_str());
            }
            if !tool_calls.is_empty() {
                args.tool_calls(
                    tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        })
                        .collect::<Vec<_>>(),
                );
            }
            args.build().map_err(build_err)?.into()
        }
        ChatMessage::Tool {
            tool_call_id,
            content,
        } => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(tool_call_id.as_str())
            .content(content.as_str())
            .build()
            .map_err(build_err)?
            .into(),
    };
    Ok(built)
}

fn to_tool(spec: &ToolSpec) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: spec.name.clone(),
            description: Some(spec.description.clone()),
            parameters: Some(spec.parameters.clone()),
            strict: None,
        },
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, messages, tools), fields(model = %self.model, messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ChatMessage> {
        let messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(self.temperature);
        if !tools.is_empty() {
            args.tools(tools.iter().map(to_tool).collect::<Vec<_>>());
        }
        let request = args.build().map_err(build_err)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TutorError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TutorError::Agent("No response from model".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolInvocation {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect::<Vec<_>>();

        debug!(
            "Model replied with {} tool call(s), content: {}",
            tool_calls.len(),
            choice.message.content.is_some()
        );

        Ok(ChatMessage::Assistant {
            content: choice.message.content,
            tool_calls,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_spec_becomes_function_tool() {
        let tool = to_tool(&ToolSpec {
            name: "get_shoe_data".to_string(),
            description: "Search the graph".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        });
        assert_eq!(tool.function.name, "get_shoe_data");
        assert_eq!(tool.r#type, ChatCompletionToolType::Function);
    }

    #[test]
    fn test_assistant_tool_request_translates() {
        let message = ChatMessage::Assistant {
            content: None,
            tool_calls: vec![ToolInvocation {
                id: "call_9".to_string(),
                name: "get_shoe_data".to_string(),
                arguments: r#"{"query":"runners"}"#.to_string(),
            }],
        };
        match to_request_message(&message).unwrap() {
            ChatCompletionRequestMessage::Assistant(assistant) => {
                let calls = assistant.tool_calls.unwrap();
                assert_eq!(calls[0].id, "call_9");
                assert_eq!(calls[0].function.arguments, r#"{"query":"runners"}"#);
            }
            other => panic!("Expected assistant message, got {:?}", other),
        }
    }
}
