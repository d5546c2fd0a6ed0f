//! MCP protocol types (JSON-RPC 2.0), client side.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol revision announced during `initialize`.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// Header carrying the session assigned by the server.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// JSON-RPC request or notification (no id).
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn call(id: u64, method: &str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Some(id),
            method: method.to_string(),
            params: Some(params),
        }
    }

    pub fn notification(method: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            id: None,
            method: method.to_string(),
            params: None,
        }
    }
}

/// JSON-RPC response.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Whether this response answers the request with the given id.
    pub fn answers(&self, id: u64) -> bool {
        match &self.id {
            Some(Value::Number(n)) => n.as_u64() == Some(id),
            Some(Value::String(s)) => s.parse::<u64>().ok() == Some(id),
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// MCP Initialize request params.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: &'static str,
    pub capabilities: Value,
    pub client_info: ClientInfo,
}

impl Default for InitializeParams {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            capabilities: Value::Object(Default::default()),
            client_info: ClientInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Tool call request params.
#[derive(Debug, Serialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Value,
}

/// Tool call response.
#[derive(Debug, Deserialize)]
pub struct ToolCallResult {
    #[serde(default)]
    pub content: Vec<ToolContent>,
    #[serde(rename = "structuredContent", default)]
    pub structured_content: Option<Value>,
    #[serde(rename = "isError", default)]
    pub is_error: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl ToolCallResult {
    /// Concatenated text content.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                ToolContent::Text { text } => Some(text.as_str()),
                ToolContent::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The tool's JSON payload.
    ///
    /// A structured content object wins; otherwise the first text item is
    /// parsed as JSON, or returned as a JSON string when it is not JSON.
    pub fn payload(&self) -> Value {
        if let Some(structured @ Value::Object(_)) = &self.structured_content {
            return structured.clone();
        }
        let text = self
            .content
            .iter()
            .find_map(|c| match c {
                ToolContent::Text { text } => Some(text.as_str()),
                ToolContent::Other => None,
            })
            .unwrap_or_default();
        serde_json::from_str::<Value>(text).unwrap_or_else(|_| Value::String(text.to_string()))
    }
}

/// Pull the response to request `id` out of a `text/event-stream` body.
pub fn response_from_sse(body: &str, id: u64) -> Option<JsonRpcResponse> {
    let mut data = String::new();
    let mut events = Vec::new();

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            if !data.is_empty() {
                events.push(std::mem::take(&mut data));
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    if !data.is_empty() {
        events.push(data);
    }

    events
        .iter()
        .filter_map(|event| serde_json::from_str::<JsonRpcResponse>(event).ok())
        .find(|response| response.answers(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_has_no_id() {
        let value = serde_json::to_value(JsonRpcRequest::notification(
            "notifications/initialized",
        ))
        .unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "method": "notifications/initialized"}));
    }

    #[test]
    fn test_sse_picks_matching_response() {
        let body = "event: message\r\n\
                    data: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/message\",\"params\":{}}\r\n\
                    \r\n\
                    event: message\r\n\
                    data: {\"jsonrpc\":\"2.0\",\"id\":7,\"result\":{\"ok\":true}}\r\n\
                    \r\n";

        let response = response_from_sse(body, 7).unwrap();
        assert_eq!(response.result, Some(json!({"ok": true})));
        assert!(response_from_sse(body, 8).is_none());
    }

    #[test]
    fn test_payload_prefers_structured_content() {
        let result: ToolCallResult = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "{\"episodes\": []}"}],
            "structuredContent": {"episodes": [{"name": "from-structured"}]}
        }))
        .unwrap();
        assert_eq!(result.payload(), json!({"episodes": [{"name": "from-structured"}]}));
    }

    #[test]
    fn test_payload_reads_first_text_item() {
        let result: ToolCallResult = serde_json::from_value(json!({
            "content": [
                {"type": "image", "data": "...", "mimeType": "image/png"},
                {"type": "text", "text": "{\"message\": \"ok\", \"facts\": []}"},
                {"type": "text", "text": "trailing note"}
            ],
            "structuredContent": "not an object"
        }))
        .unwrap();
        assert_eq!(result.payload(), json!({"message": "ok", "facts": []}));
    }

    #[test]
    fn test_payload_non_json_text_is_a_string() {
        let structured: ToolCallResult = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "Graph cleared"}],
            "structuredContent": {"message": "Graph cleared"}
        }))
        .unwrap();
        assert_eq!(structured.payload(), json!({"message": "Graph cleared"}));

        let plain: ToolCallResult = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "Graph cleared"}]
        }))
        .unwrap();
        assert_eq!(plain.payload(), json!("Graph cleared"));
    }
}
