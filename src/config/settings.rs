//! Configuration settings for graphiti-tutor.

use crate::error::{Result, TutorError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub graph: GraphSettings,
    pub llm: LlmSettings,
    pub sales: SalesSettings,
    pub checkpoint: CheckpointSettings,
    pub prompts: PromptSettings,
}

/// Knowledge graph backend type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum GraphProvider {
    /// Graph server reached over MCP streamable HTTP (default).
    #[default]
    Mcp,
    /// In-process store, for offline demos and tests.
    Memory,
}

impl std::str::FromStr for GraphProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mcp" | "http" => Ok(GraphProvider::Mcp),
            "memory" => Ok(GraphProvider::Memory),
            _ => Err(format!("Unknown graph provider: {}", s)),
        }
    }
}

impl std::fmt::Display for GraphProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphProvider::Mcp => write!(f, "mcp"),
            GraphProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Knowledge graph connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Backend provider (mcp, memory).
    pub provider: GraphProvider,
    /// Endpoint of the graph server.
    pub uri: String,
    /// Username for the graph server.
    pub user: String,
    /// Password for the graph server.
    pub password: String,
    /// Partition of the graph that episodes are written to and searched in.
    pub group_id: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            provider: GraphProvider::Mcp,
            uri: "http://localhost:8000/mcp/".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            group_id: None,
            timeout_secs: 60,
        }
    }
}

/// Chat model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model used by the sales agent.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4.1-mini".to_string(),
            temperature: 0.0,
            timeout_secs: crate::openai::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Settings for the sales agent walkthrough.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesSettings {
    /// Name of the shopper persona created during setup.
    pub user_name: String,
    /// Brand whose product catalog is ingested.
    pub brand: String,
    /// Product catalog JSON (`{"products": [...]}`).
    pub products_path: String,
    /// Facts pulled into the system prompt on each agent step.
    pub context_facts: usize,
    /// Facts returned by the product lookup tool.
    pub tool_facts: usize,
    /// Maximum agent/tool steps per turn.
    pub recursion_limit: usize,
    /// Lookups of the user and brand nodes after setup, while ingestion catches up.
    pub resolve_attempts: usize,
    /// Pause between those lookups.
    pub resolve_delay_secs: u64,
}

impl Default for SalesSettings {
    fn default() -> Self {
        Self {
            user_name: "jess".to_string(),
            brand: "ManyBirds".to_string(),
            products_path: "data/manybirds_products.json".to_string(),
            context_facts: 5,
            tool_facts: 10,
            recursion_limit: 25,
            resolve_attempts: 10,
            resolve_delay_secs: 3,
        }
    }
}

/// Conversation checkpoint backend type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointProvider {
    #[default]
    Memory,
    Sqlite,
}

/// Conversation checkpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointSettings {
    /// Checkpoint provider (memory, sqlite).
    pub provider: CheckpointProvider,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for CheckpointSettings {
    fn default() -> Self {
        Self {
            provider: CheckpointProvider::Memory,
            sqlite_path: "~/.graphiti-tutor/checkpoints.db".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Override for the sales agent system prompt. Supports `{{brand}}` and `{{facts}}`.
    pub sales_system: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment variables take precedence over the file.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Overlay values from the environment onto the loaded settings.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = var("GRAPH_URI") {
            self.graph.uri = uri;
        }
        if let Some(user) = var("GRAPH_USER") {
            self.graph.user = user;
        }
        if let Some(password) = var("GRAPH_PASSWORD") {
            self.graph.password = password;
        }
        if let Some(group_id) = var("GRAPH_GROUP_ID") {
            self.graph.group_id = Some(group_id).filter(|g| !g.is_empty());
        }
        if let Some(provider) = var("GRAPH_PROVIDER").and_then(|p| p.parse().ok()) {
            self.graph.provider = provider;
        }
        if let Some(model) = var("SALES_MODEL") {
            self.llm.model = model;
        }
    }

    /// Reject settings the graph connection cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.graph.provider == GraphProvider::Mcp
            && (self.graph.uri.is_empty()
                || self.graph.user.is_empty()
                || self.graph.password.is_empty())
        {
            return Err(TutorError::Config(
                "GRAPH_URI, GRAPH_USER, and GRAPH_PASSWORD must be set".to_string(),
            ));
        }
        if self.sales.recursion_limit == 0 {
            return Err(TutorError::Config(
                "sales.recursion_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TutorError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("graphiti-tutor")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded checkpoint database path.
    pub fn checkpoint_path(&self) -> PathBuf {
        Self::expand_path(&self.checkpoint.sqlite_path)
    }

    /// Get the expanded product catalog path.
    pub fn products_path(&self) -> PathBuf {
        Self::expand_path(&self.sales.products_path)
    }
}
