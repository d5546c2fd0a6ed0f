//! CLI output formatting utilities.

use crate::graph::{EntityEdge, EntityNode, EpisodeRecord};
use crate::quickstart::summary_preview;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a fact from an edge search.
    pub fn fact(edge: &EntityEdge) {
        println!("\n{} {}", style(">>").green(), edge.fact);
        Output::kv("uuid", &edge.uuid);
        if let Some(valid_at) = edge.valid_at {
            Output::kv("valid from", &valid_at.to_string());
        }
        if let Some(invalid_at) = edge.invalid_at {
            Output::kv("valid until", &invalid_at.to_string());
        }
    }

    /// Print an entity from a node search.
    pub fn node(node: &EntityNode) {
        println!("\n{} {}", style(">>").green(), style(&node.name).bold());
        Output::kv("uuid", &node.uuid);
        if !node.labels.is_empty() {
            Output::kv("labels", &node.labels.join(", "));
        }
        if !node.summary.is_empty() {
            println!("   {}", summary_preview(&node.summary.replace('\n', " ")));
        }
    }

    /// Print a stored episode.
    pub fn episode(episode: &EpisodeRecord) {
        let created = episode
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "  {} {} {} {}",
            style("*").cyan(),
            style(&episode.name).bold(),
            style(&episode.uuid).dim(),
            style(created).dim()
        );
        println!("    {}", content_preview(&episode.content, 120));
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_len: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_len {
        content
    } else {
        let cut: String = content.chars().take(max_len).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("a\nb", 10), "a b");
        assert_eq!(content_preview("abcdef", 3), "abc...");
        assert_eq!(content_preview("ééééé", 2), "éé...");
    }
}
