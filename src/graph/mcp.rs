//! Knowledge graph client over MCP streamable HTTP.
//!
//! The graph server exposes ingestion and search as MCP tools. Every
//! request is a JSON-RPC POST to one endpoint; replies come back either as a
//! plain JSON body or as a short server-sent event stream.

use super::protocol::{
    response_from_sse, InitializeParams, JsonRpcRequest, JsonRpcResponse, ToolCallParams,
    ToolCallResult, SESSION_HEADER,
};
use super::{
    EdgeSearch, EntityEdge, EntityNode, EpisodeRecord, KnowledgeGraph, NewEpisode,
    NodeSearchConfig,
};
use crate::config::GraphSettings;
use crate::error::{Result, TutorError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

const ACCEPT_BOTH: &str = "application/json, text/event-stream";

/// Tool names published by the graph server.
mod tools {
    pub const ADD_MEMORY: &str = "add_memory";
    pub const SEARCH_FACTS: &str = "search_memory_facts";
    pub const SEARCH_NODES: &str = "search_memory_nodes";
    pub const GET_EPISODES: &str = "get_episodes";
    pub const CLEAR_GRAPH: &str = "clear_graph";
}

/// An established MCP session.
#[derive(Debug, Clone, PartialEq)]
struct Session {
    id: Option<String>,
}

/// Graph client speaking MCP to a remote graph server.
pub struct McpGraph {
    http: reqwest::Client,
    endpoint: Url,
    user: String,
    password: String,
    group_id: Option<String>,
    session: Mutex<Option<Session>>,
    next_id: AtomicU64,
}

impl McpGraph {
    /// Create a client for the configured endpoint. No connection is made
    /// until the first call.
    pub fn new(settings: &GraphSettings) -> Result<Self> {
        let endpoint = Url::parse(&settings.uri)
            .map_err(|e| TutorError::Config(format!("Invalid graph URI '{}': {}", settings.uri, e)))?;

        match endpoint.scheme() {
            "http" | "https" => {}
            other => {
                return Err(TutorError::Config(format!(
                    "Graph URI must be http(s), got '{}'",
                    other
                )))
            }
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            user: settings.user.clone(),
            password: settings.password.clone(),
            group_id: settings.group_id.clone(),
            session: Mutex::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    fn request(&self, method: reqwest::Method, session_id: Option<&str>) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, self.endpoint.clone())
            .header(ACCEPT, ACCEPT_BOTH);
        if !self.user.is_empty() {
            builder = builder.basic_auth(&self.user, Some(&self.password));
        }
        if let Some(id) = session_id {
            builder = builder.header(SESSION_HEADER, id);
        }
        builder
    }

    async fn post(
        &self,
        body: &JsonRpcRequest,
        session_id: Option<&str>,
    ) -> Result<reqwest::Response> {
        let response = self
            .request(reqwest::Method::POST, session_id)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND && session_id.is_some() {
            return Err(TutorError::SessionExpired);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TutorError::Graph(format!(
                "{} returned {}: {}",
                body.method,
                status,
                text.trim()
            )));
        }
        Ok(response)
    }

    /// Read the JSON-RPC reply to request `id`, whichever framing the server chose.
    async fn read_reply(response: reqwest::Response, id: u64) -> Result<Value> {
        let is_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));

        let body = response.text().await?;
        let reply = if is_stream {
            response_from_sse(&body, id).ok_or_else(|| {
                TutorError::Protocol(format!("No response to request {} in event stream", id))
            })?
        } else {
            let reply: JsonRpcResponse = serde_json::from_str(&body)?;
            if !reply.answers(id) {
                return Err(TutorError::Protocol(format!(
                    "Response id does not match request {}",
                    id
                )));
            }
            reply
        };

        if let Some(err) = reply.error {
            return Err(TutorError::Protocol(format!(
                "{} (code {})",
                err.message, err.code
            )));
        }
        reply
            .result
            .ok_or_else(|| TutorError::Protocol("Response carried neither result nor error".to_string()))
    }

    /// Return the current session, performing the initialize handshake if needed.
    async fn session(&self) -> Result<Session> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let params = serde_json::to_value(InitializeParams::default())?;
        let response = self
            .post(&JsonRpcRequest::call(id, "initialize", params), None)
            .await?;

        let session_id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let result = Self::read_reply(response, id).await?;
        let server = result
            .pointer("/serverInfo/name")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let version = result
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(
            "Connected to graph server '{}' at {} (protocol {})",
            server, self.endpoint, version
        );

        self.post(
            &JsonRpcRequest::notification("notifications/initialized"),
            session_id.as_deref(),
        )
        .await?;

        let session = Session { id: session_id };
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Drop `stale` so the next call negotiates a new session. A session
    /// another caller already replaced is left alone.
    async fn forget_session(&self, stale: &Session) {
        let mut guard = self.session.lock().await;
        if guard.as_ref() == Some(stale) {
            *guard = None;
        }
    }

    /// Invoke a server tool and return its JSON payload.
    ///
    /// A session the server no longer knows is renegotiated once.
    #[instrument(skip(self, arguments))]
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        let session = self.session().await?;
        match self.send_tool_call(&session, name, &arguments).await {
            Err(TutorError::SessionExpired) => {
                warn!("Graph session expired, reconnecting");
                self.forget_session(&session).await;
                let session = self.session().await?;
                self.send_tool_call(&session, name, &arguments).await
            }
            other => other,
        }
    }

    async fn send_tool_call(&self, session: &Session, name: &str, arguments: &Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let params = serde_json::to_value(ToolCallParams {
            name: name.to_string(),
            arguments: arguments.clone(),
        })?;

        let response = self
            .post(
                &JsonRpcRequest::call(id, "tools/call", params),
                session.id.as_deref(),
            )
            .await?;
        let result: ToolCallResult = serde_json::from_value(Self::read_reply(response, id).await?)?;

        if result.is_error.unwrap_or(false) {
            return Err(TutorError::Graph(format!("{} failed: {}", name, result.text())));
        }

        let payload = result.payload();
        if let Some(message) = payload.get("error").and_then(Value::as_str) {
            return Err(TutorError::Graph(format!("{} failed: {}", name, message)));
        }
        debug!("{} returned {}", name, payload);
        Ok(payload)
    }

    fn group_ids(&self) -> Option<Value> {
        self.group_id.as_ref().map(|g| json!([g]))
    }
}

/// Deserialize the list stored under `key`, or the payload itself if it is a list.
fn list_field<T: DeserializeOwned>(payload: Value, key: &str) -> Result<Vec<T>> {
    let list = match payload {
        Value::Array(_) => payload,
        Value::Object(mut map) => map.remove(key).unwrap_or(Value::Array(Vec::new())),
        other => {
            return Err(TutorError::Protocol(format!(
                "Expected '{}' in tool payload, got {}",
                key, other
            )))
        }
    };
    Ok(serde_json::from_value(list)?)
}

/// Build an argument object, skipping absent optional values.
fn arguments(pairs: Vec<(&str, Option<Value>)>) -> Value {
    let map: Map<String, Value> = pairs
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
        .collect();
    Value::Object(map)
}

#[async_trait]
impl KnowledgeGraph for McpGraph {
    async fn add_episode(&self, episode: &NewEpisode) -> Result<()> {
        let args = arguments(vec![
            ("name", Some(json!(episode.name))),
            ("episode_body", Some(json!(episode.body))),
            ("source", Some(json!(episode.source))),
            ("source_description", Some(json!(episode.source_description))),
            ("group_id", self.group_id.as_ref().map(|g| json!(g))),
        ]);
        let payload = self.call_tool(tools::ADD_MEMORY, args).await?;
        if let Some(message) = payload.get("message").and_then(Value::as_str) {
            debug!("{}", message);
        }
        Ok(())
    }

    async fn search(&self, search: &EdgeSearch) -> Result<Vec<EntityEdge>> {
        let args = arguments(vec![
            ("query", Some(json!(search.query))),
            ("max_facts", Some(json!(search.num_results))),
            ("center_node_uuid", search.center_node_uuid.as_ref().map(|c| json!(c))),
            ("group_ids", self.group_ids()),
        ]);
        let payload = self.call_tool(tools::SEARCH_FACTS, args).await?;
        let mut facts: Vec<EntityEdge> = list_field(payload, "facts")?;
        facts.truncate(search.num_results);
        Ok(facts)
    }

    async fn search_nodes(
        &self,
        query: &str,
        config: &NodeSearchConfig,
    ) -> Result<Vec<EntityNode>> {
        debug!("Node search with recipe {}", config.recipe);
        let args = arguments(vec![
            ("query", Some(json!(query))),
            ("max_nodes", Some(json!(config.limit))),
            ("center_node_uuid", config.center_node_uuid().map(|c| json!(c))),
            ("group_ids", self.group_ids()),
        ]);
        let payload = self.call_tool(tools::SEARCH_NODES, args).await?;
        let mut nodes: Vec<EntityNode> = list_field(payload, "nodes")?;
        nodes.truncate(config.limit);
        Ok(nodes)
    }

    async fn episodes(&self, last_n: usize) -> Result<Vec<EpisodeRecord>> {
        let args = arguments(vec![
            ("last_n", Some(json!(last_n))),
            ("group_id", self.group_id.as_ref().map(|g| json!(g))),
        ]);
        let payload = self.call_tool(tools::GET_EPISODES, args).await?;
        list_field(payload, "episodes")
    }

    async fn clear(&self) -> Result<()> {
        self.call_tool(tools::CLEAR_GRAPH, json!({})).await?;
        info!("Graph cleared and indices rebuilt");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let Some(session) = self.session.lock().await.take() else {
            return Ok(());
        };
        let Some(id) = session.id else {
            return Ok(());
        };

        let response = self
            .request(reqwest::Method::DELETE, Some(&id))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            debug!("Session {} terminated", id);
        } else if status == StatusCode::METHOD_NOT_ALLOWED {
            debug!("Server does not support session termination");
        } else {
            warn!("Session termination returned {}", status);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphSettings;

    #[test]
    fn test_rejects_non_http_uri() {
        let settings = GraphSettings {
            uri: "bolt://localhost:7687".to_string(),
            ..GraphSettings::default()
        };
        assert!(matches!(McpGraph::new(&settings), Err(TutorError::Config(_))));
    }

    #[test]
    fn test_arguments_skip_missing_values() {
        let args = arguments(vec![
            ("query", Some(json!("shoes"))),
            ("center_node_uuid", None),
        ]);
        assert_eq!(args, json!({"query": "shoes"}));
    }

    #[test]
    fn test_list_field_accepts_bare_list() {
        let episodes: Vec<EpisodeRecord> = list_field(
            json!([{"uuid": "ep1", "name": "User Creation", "content": "jess is here"}]),
            "episodes",
        )
        .unwrap();
        assert_eq!(episodes[0].name, "User Creation");

        let none: Vec<EpisodeRecord> =
            list_field(json!({"message": "No episodes found"}), "episodes").unwrap();
        assert!(none.is_empty());
    }
}
