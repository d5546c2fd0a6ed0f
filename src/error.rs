//! Error types for graphiti-tutor.

use thiserror::Error;

/// Library-level error type for tutorial operations.
#[derive(Error, Debug)]
pub enum TutorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Knowledge graph error: {0}")]
    Graph(String),

    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("MCP session expired or unknown to the graph server")]
    SessionExpired,

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Sample data error: {0}")]
    SampleData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for tutorial operations.
pub type Result<T> = std::result::Result<T, TutorError>;
