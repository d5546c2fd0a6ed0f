//! Doctor command - verify configuration and graph connectivity.

use crate::cli::preflight::check_graph_uri;
use crate::cli::Output;
use crate::config::{CheckpointProvider, GraphProvider, Settings};
use crate::graph::open_graph;
use crate::sales::load_products;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("graphiti-tutor Doctor");
    println!();
    println!("Checking configuration and connectivity...\n");

    let mut checks = Vec::new();

    println!("{}", style("Graph Server").bold());
    let graph_checks = check_graph(settings).await;
    for check in &graph_checks {
        check.print();
    }
    checks.extend(graph_checks);

    println!();

    println!("{}", style("API Configuration").bold());
    let api_check = check_openai_api_key(std::env::var("OPENAI_API_KEY").ok());
    api_check.print();
    checks.push(api_check);

    println!();

    println!("{}", style("Data").bold());
    let data_checks = vec![check_products(&settings.products_path()), check_checkpoints(settings)];
    for check in &data_checks {
        check.print();
    }
    checks.extend(data_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before running the walkthroughs.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Ready to go.");
    }

    Ok(())
}

/// Check the graph endpoint and try a cheap read against it.
async fn check_graph(settings: &Settings) -> Vec<CheckResult> {
    if settings.graph.provider == GraphProvider::Memory {
        return vec![CheckResult::warning(
            "Provider",
            "memory (nothing is persisted, no extraction)",
            "Set graph.provider = \"mcp\" to use a graph server",
        )];
    }

    let mut results = Vec::new();
    if let Err(e) = check_graph_uri(&settings.graph) {
        results.push(CheckResult::error(
            "GRAPH_URI",
            &e.to_string(),
            "Example: export GRAPH_URI='http://localhost:8000/mcp/'",
        ));
        return results;
    }
    results.push(CheckResult::ok("GRAPH_URI", &settings.graph.uri));

    let reachable = match open_graph(&settings.graph) {
        Ok(graph) => {
            let probe = graph.episodes(1).await;
            let _ = graph.close().await;
            probe.map(|_| ())
        }
        Err(e) => Err(e),
    };
    results.push(match reachable {
        Ok(()) => CheckResult::ok("Connection", "graph server answered"),
        Err(e) => CheckResult::error(
            "Connection",
            &e.to_string(),
            "Start the graphiti MCP server and check GRAPH_USER / GRAPH_PASSWORD",
        ),
    });

    results
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key(key: Option<String>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.chars().count() > 20 => {
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask_key(&key)))
        }
        Some(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::warning(
            "OPENAI_API_KEY",
            "not set (only needed for salesbot)",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// First seven and last four characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check the sales agent's product catalog.
fn check_products(path: &Path) -> CheckResult {
    match load_products(path) {
        Ok(Some(products)) => CheckResult::ok(
            "Product catalog",
            &format!("{} ({} products)", path.display(), products.len()),
        ),
        Ok(None) => CheckResult::warning(
            "Product catalog",
            &format!("{} not found", path.display()),
            "Set sales.products_path; salesbot setup needs it",
        ),
        Err(e) => CheckResult::error(
            "Product catalog",
            &e.to_string(),
            "Expected a JSON object with a \"products\" array",
        ),
    }
}

/// Check the conversation checkpoint store.
fn check_checkpoints(settings: &Settings) -> CheckResult {
    match settings.checkpoint.provider {
        CheckpointProvider::Memory => {
            CheckResult::ok("Checkpoints", "in memory (conversations end with the session)")
        }
        CheckpointProvider::Sqlite => {
            let path = settings.checkpoint_path();
            if path.exists() {
                CheckResult::ok("Checkpoints", &format!("{}", path.display()))
            } else {
                CheckResult::warning(
                    "Checkpoints",
                    &format!("{} (not created yet)", path.display()),
                    "Database will be created on the first conversation",
                )
            }
        }
    }
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: graphiti-tutor config edit",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_api_key_checks() {
        assert_eq!(check_openai_api_key(None).status, CheckStatus::Warning);
        assert_eq!(check_openai_api_key(Some(String::new())).status, CheckStatus::Error);

        let ok = check_openai_api_key(Some("sk-abcdefghijklmnopqrstuvwxyz".to_string()));
        assert_eq!(ok.status, CheckStatus::Ok);
        assert!(ok.message.contains("sk-abcd...wxyz"));

        let multibyte = check_openai_api_key(Some("sk-ééééééééééééééééééééé€€".to_string()));
        assert_eq!(multibyte.status, CheckStatus::Ok);
        assert!(multibyte.message.contains("sk-éééé...éé€€"));
    }

    #[test]
    fn test_missing_catalog_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let result = check_products(&dir.path().join("missing.json"));
        assert_eq!(result.status, CheckStatus::Warning);
    }

    #[tokio::test]
    async fn test_memory_provider_skips_connection() {
        let mut settings = Settings::default();
        settings.graph.provider = GraphProvider::Memory;
        let checks = check_graph(&settings).await;
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].status, CheckStatus::Warning);
    }
}
