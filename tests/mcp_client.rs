//! McpGraph against a scripted graph server on a local port.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use graphiti_tutor::config::GraphSettings;
use graphiti_tutor::graph::{
    EdgeSearch, EpisodeType, KnowledgeGraph, McpGraph, NewEpisode, NodeSearchConfig,
};
use graphiti_tutor::TutorError;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Mock {
    /// Reply to tool calls with an event stream instead of a JSON body.
    sse: bool,
    /// Put the payload in `structuredContent` and leave an empty object in the text.
    structured: bool,
    log: Arc<Mutex<Log>>,
}

#[derive(Default)]
struct Log {
    /// Bumped to simulate a server restart that forgets every session.
    generation: usize,
    initializes: usize,
    notified: bool,
    deletes: usize,
    /// (tool name, arguments)
    calls: Vec<(String, Value)>,
    authorization: Vec<Option<String>>,
}

impl Mock {
    fn log(&self) -> std::sync::MutexGuard<'_, Log> {
        self.log.lock().unwrap()
    }

    fn session_id(&self) -> String {
        format!("sess-{}", self.log().generation + 1)
    }

    fn knows_session(&self, headers: &HeaderMap) -> bool {
        headers
            .get("mcp-session-id")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|id| id == self.session_id())
    }
}

fn tool_payload(name: &str, args: &Value) -> Value {
    match name {
        "search_memory_facts" => json!({
            "message": "Facts retrieved successfully",
            "facts": [
                {
                    "uuid": "e1",
                    "name": "HELD_OFFICE",
                    "fact": "Kamala Harris was the Attorney General of California",
                    "source_node_uuid": "harris",
                    "target_node_uuid": "california",
                    "valid_at": "2011-01-03T00:00:00Z",
                    "invalid_at": "2017-01-03T00:00:00"
                },
                {"uuid": "e2", "fact": "Gavin Newsom is the Governor of California"},
                {"uuid": "e3", "fact": "Harris was district attorney for San Francisco"}
            ]
        }),
        "search_memory_nodes" if args["query"] == "boom" => {
            json!({"error": "Error searching nodes: boom"})
        }
        "search_memory_nodes" => json!({
            "message": "Nodes retrieved successfully",
            "nodes": [
                {
                    "uuid": "n1",
                    "name": "jess",
                    "summary": "jess is interested in buying a pair of shoes",
                    "labels": ["Entity"],
                    "created_at": "2025-06-01 10:00:00.123",
                    "attributes": {"shoe_size": 8}
                }
            ]
        }),
        "add_memory" => json!({
            "message": format!("Episode '{}' queued for processing", args["name"].as_str().unwrap_or(""))
        }),
        "get_episodes" => json!([
            {"uuid": "ep2", "name": "User Creation", "content": "jess is interested in buying a pair of shoes", "source": "text"},
            {"uuid": "ep1", "name": "Freakonomics Radio 0", "content": "Kamala Harris is the Attorney General of California."}
        ]),
        "clear_graph" => json!({"message": "Graph cleared successfully and indices rebuilt"}),
        _ => json!({"error": format!("Unknown tool {}", name)}),
    }
}

async fn rpc(State(mock): State<Mock>, headers: HeaderMap, Json(request): Json<Value>) -> Response {
    mock.log().authorization.push(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );

    let method = request["method"].as_str().unwrap_or_default().to_string();
    let id = request["id"].clone();

    if method == "initialize" {
        mock.log().initializes += 1;
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {
                "protocolVersion": "2025-03-26",
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "graphiti-mock", "version": "0.0.1"}
            }
        });
        return (
            [(HeaderName::from_static("mcp-session-id"), mock.session_id())],
            Json(body),
        )
            .into_response();
    }

    if !mock.knows_session(&headers) {
        return StatusCode::NOT_FOUND.into_response();
    }

    if method == "notifications/initialized" {
        mock.log().notified = true;
        return StatusCode::ACCEPTED.into_response();
    }

    let name = request["params"]["name"].as_str().unwrap_or_default().to_string();
    let args = request["params"]["arguments"].clone();
    let payload = tool_payload(&name, &args);
    mock.log().calls.push((name, args));

    let result = if mock.structured {
        let payload = if payload.is_array() {
            json!({"episodes": payload})
        } else {
            payload
        };
        json!({
            "content": [{"type": "text", "text": "{}"}],
            "structuredContent": payload,
            "isError": false
        })
    } else {
        json!({
            "content": [{"type": "text", "text": payload.to_string()}],
            "isError": false
        })
    };
    let body = json!({"jsonrpc": "2.0", "id": id, "result": result});

    if mock.sse {
        let stream = format!("event: message\ndata: {}\n\n", body);
        ([(header::CONTENT_TYPE, "text/event-stream")], stream).into_response()
    } else {
        Json(body).into_response()
    }
}

async fn end_session(State(mock): State<Mock>, headers: HeaderMap) -> StatusCode {
    if mock.knows_session(&headers) {
        mock.log().deletes += 1;
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn serve(mock: Mock) -> GraphSettings {
    let app = Router::new()
        .route("/mcp/", post(rpc).delete(end_session))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    GraphSettings {
        uri: format!("http://{}/mcp/", addr),
        group_id: Some("tutorial".to_string()),
        ..GraphSettings::default()
    }
}

#[tokio::test]
async fn search_performs_handshake_once_and_truncates() {
    let mock = Mock::default();
    let graph = McpGraph::new(&serve(mock.clone()).await).unwrap();

    let search = EdgeSearch::new("Who was the California Attorney General?")
        .with_center("harris")
        .with_num_results(2);
    let facts = graph.search(&search).await.unwrap();
    graph.search(&search).await.unwrap();

    assert_eq!(facts.len(), 2);
    assert_eq!(facts[0].source_node_uuid.as_deref(), Some("harris"));
    assert_eq!(facts[0].valid_at.unwrap().to_rfc3339(), "2011-01-03T00:00:00+00:00");
    assert!(facts[0].invalid_at.is_some());
    assert!(facts[1].valid_at.is_none());

    let log = mock.log();
    assert_eq!(log.initializes, 1);
    assert!(log.notified);
    assert_eq!(log.calls.len(), 2);

    let (name, args) = &log.calls[0];
    assert_eq!(name, "search_memory_facts");
    assert_eq!(
        args,
        &json!({
            "query": "Who was the California Attorney General?",
            "max_facts": 2,
            "center_node_uuid": "harris",
            "group_ids": ["tutorial"]
        })
    );

    assert!(log
        .authorization
        .iter()
        .all(|auth| auth.as_deref().is_some_and(|a| a.starts_with("Basic "))));
}

#[tokio::test]
async fn node_search_reads_event_stream_replies() {
    let mock = Mock {
        sse: true,
        ..Mock::default()
    };
    let graph = McpGraph::new(&serve(mock.clone()).await).unwrap();

    let nodes = graph
        .search_nodes("jess", &NodeSearchConfig::episode_mentions())
        .await
        .unwrap();

    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].uuid, "n1");
    assert_eq!(nodes[0].attributes["shoe_size"], json!(8));
    assert!(nodes[0].created_at.is_some());

    let log = mock.log();
    let (_, args) = &log.calls[0];
    assert_eq!(args["max_nodes"], json!(10));
    assert!(args.get("center_node_uuid").is_none());
}

#[tokio::test]
async fn node_distance_recipe_sends_center() {
    let mock = Mock::default();
    let graph = McpGraph::new(&serve(mock.clone()).await).unwrap();

    graph
        .search_nodes("shoes", &NodeSearchConfig::node_distance("brand").with_limit(3))
        .await
        .unwrap();

    let log = mock.log();
    let (_, args) = &log.calls[0];
    assert_eq!(args["center_node_uuid"], json!("brand"));
    assert_eq!(args["max_nodes"], json!(3));
}

#[tokio::test]
async fn ingestion_listing_and_clearing() {
    let mock = Mock::default();
    let graph = McpGraph::new(&serve(mock.clone()).await).unwrap();

    graph
        .add_episode(&NewEpisode::new(
            "Freakonomics Radio 2",
            r#"{"name":"Gavin Newsom","position":"Governor"}"#,
            EpisodeType::Json,
            "podcast metadata",
        ))
        .await
        .unwrap();
    let episodes = graph.episodes(2).await.unwrap();
    graph.clear().await.unwrap();

    assert_eq!(episodes.len(), 2);
    assert_eq!(episodes[0].name, "User Creation");

    let log = mock.log();
    let names: Vec<&str> = log.calls.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["add_memory", "get_episodes", "clear_graph"]);

    let add = &log.calls[0].1;
    assert_eq!(add["source"], json!("json"));
    assert_eq!(add["source_description"], json!("podcast metadata"));
    assert_eq!(add["group_id"], json!("tutorial"));
    assert_eq!(log.calls[1].1["last_n"], json!(2));
}

#[tokio::test]
async fn error_payload_becomes_graph_error() {
    let mock = Mock::default();
    let graph = McpGraph::new(&serve(mock).await).unwrap();

    let err = graph
        .search_nodes("boom", &NodeSearchConfig::hybrid_rrf())
        .await
        .unwrap_err();
    match err {
        TutorError::Graph(message) => assert!(message.contains("Error searching nodes: boom")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn close_ends_session_and_next_call_reconnects() {
    let mock = Mock::default();
    let graph = McpGraph::new(&serve(mock.clone()).await).unwrap();

    graph.close().await.unwrap();
    assert_eq!(mock.log().deletes, 0);

    graph.episodes(1).await.unwrap();
    graph.close().await.unwrap();
    assert_eq!(mock.log().deletes, 1);

    graph.episodes(1).await.unwrap();
    assert_eq!(mock.log().initializes, 2);
}

#[tokio::test]
async fn structured_content_wins_over_text() {
    let mock = Mock {
        structured: true,
        ..Mock::default()
    };
    let graph = McpGraph::new(&serve(mock).await).unwrap();

    let episodes = graph.episodes(2).await.unwrap();
    assert_eq!(episodes.len(), 2);
    assert_eq!(episodes[1].name, "Freakonomics Radio 0");
}

#[tokio::test]
async fn expired_session_is_renegotiated() {
    let mock = Mock::default();
    let graph = McpGraph::new(&serve(mock.clone()).await).unwrap();

    graph.episodes(1).await.unwrap();
    mock.log().generation += 1;

    let episodes = graph.episodes(1).await.unwrap();
    graph.episodes(1).await.unwrap();
    assert_eq!(episodes.len(), 2);

    let log = mock.log();
    assert_eq!(log.initializes, 2);
    assert_eq!(log.calls.len(), 3);
}

#[tokio::test]
async fn unreachable_server_is_an_error() {
    let settings = GraphSettings {
        uri: "http://127.0.0.1:9/mcp/".to_string(),
        timeout_secs: 2,
        ..GraphSettings::default()
    };
    let graph = McpGraph::new(&settings).unwrap();
    assert!(graph.episodes(1).await.is_err());
}
