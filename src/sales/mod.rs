//! Graph setup for the sales agent.
//!
//! Setup wipes the graph, ingests the product catalog and a user profile,
//! then looks up the two nodes every later search is centered on.

use crate::agent::ConversationState;
use crate::config::SalesSettings;
use crate::error::{Result, TutorError};
use crate::graph::{EpisodeType, KnowledgeGraph, NewEpisode, NodeSearchConfig};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Read the `products` array from a catalog file.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_products(path: &Path) -> Result<Option<Vec<Value>>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    let mut catalog: Value = serde_json::from_str(&content)?;
    match catalog.get_mut("products").map(Value::take) {
        Some(Value::Array(products)) => Ok(Some(products)),
        _ => Err(TutorError::SampleData(format!(
            "{} has no \"products\" array",
            path.display()
        ))),
    }
}

/// Episode body for a product: the product object without its images.
pub fn product_episode_body(product: &Value) -> Result<String> {
    let Value::Object(fields) = product else {
        return Err(TutorError::SampleData(
            "Product entries must be JSON objects".to_string(),
        ));
    };

    let trimmed: serde_json::Map<String, Value> = fields
        .iter()
        .filter(|(key, _)| key.as_str() != "images")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Ok(serde_json::to_string(&trimmed)?)
}

/// Episode name for a product: its title, or its position in the catalog.
pub fn product_name(product: &Value, index: usize) -> String {
    product
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Product {}", index))
}

/// Wipe the graph and load the catalog and user profile.
///
/// Returns `Ok(None)` when the catalog file is missing; the caller should
/// stop there. Destroys all existing graph data.
pub async fn setup_database(
    graph: &dyn KnowledgeGraph,
    settings: &SalesSettings,
    products_path: &Path,
) -> Result<Option<ConversationState>> {
    info!("Setting up the database. This may take a moment...");
    warn!("This will clear all existing data in the graph!");

    graph.clear().await?;
    info!("Database cleared.");

    let Some(products) = load_products(products_path)? else {
        error!("Product data not found at {}", products_path.display());
        return Ok(None);
    };

    let description = format!("{} products", settings.brand);
    for (i, product) in products.iter().enumerate() {
        let episode = NewEpisode::new(
            product_name(product, i),
            product_episode_body(product)?,
            EpisodeType::Json,
            description.as_str(),
        );
        graph.add_episode(&episode).await?;
    }
    info!("{} products ingested.", products.len());

    graph
        .add_episode(&NewEpisode::new(
            "User Creation",
            format!("{} is interested in buying a pair of shoes", settings.user_name),
            EpisodeType::Text,
            "SalesBot",
        ))
        .await?;

    let attempts = settings.resolve_attempts.max(1);
    let delay = Duration::from_secs(settings.resolve_delay_secs);
    let user = resolve_node(graph, &settings.user_name, attempts, delay).await?;
    let brand = resolve_node(graph, &settings.brand, attempts, delay).await?;

    match (user, brand) {
        (Some(user), Some(brand)) => {
            info!("User node and brand node created.");
            Ok(Some(ConversationState::new(&settings.user_name, user, brand)))
        }
        _ => Err(TutorError::NotFound(format!(
            "Nodes for '{}' and '{}' did not appear after ingestion",
            settings.user_name, settings.brand
        ))),
    }
}

/// Find the nodes left by an earlier setup.
///
/// Returns `Ok(None)` when either node is missing.
pub async fn resolve_existing(
    graph: &dyn KnowledgeGraph,
    settings: &SalesSettings,
) -> Result<Option<ConversationState>> {
    let user = resolve_node(graph, &settings.user_name, 1, Duration::ZERO).await?;
    let brand = resolve_node(graph, &settings.brand, 1, Duration::ZERO).await?;

    match (user, brand) {
        (Some(user), Some(brand)) => {
            info!("Existing user and brand nodes found.");
            Ok(Some(ConversationState::new(&settings.user_name, user, brand)))
        }
        _ => {
            error!(
                "Could not find existing user/brand nodes. Please run the setup by answering \"yes\"."
            );
            Ok(None)
        }
    }
}

/// UUID of the first node mentioned alongside `name` in episodes.
///
/// Retries up to `attempts` times, since freshly added episodes may still be
/// processing on the server.
pub async fn resolve_node(
    graph: &dyn KnowledgeGraph,
    name: &str,
    attempts: usize,
    delay: Duration,
) -> Result<Option<String>> {
    let config = NodeSearchConfig::episode_mentions();
    for attempt in 1..=attempts {
        let nodes = graph.search_nodes(name, &config).await?;
        if let Some(node) = nodes.into_iter().next() {
            debug!("Resolved '{}' to node {}", name, node.uuid);
            return Ok(Some(node.uuid));
        }
        if attempt < attempts {
            debug!("No node for '{}' yet (attempt {}/{})", name, attempt, attempts);
            tokio::time::sleep(delay).await;
        }
    }
    Ok(None)
}
