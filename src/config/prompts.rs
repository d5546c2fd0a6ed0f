//! Prompt templates for the sales agent.

use std::collections::HashMap;

/// Fallback rendered into the prompt when the graph has nothing to say yet.
pub const NO_FACTS: &str = "No facts about the user and their conversation";

/// Default system prompt. `{{brand}}` and `{{facts}}` are substituted per turn.
const SALES_SYSTEM: &str = r#"You are a skillful shoe salesperson for {{brand}}. Review the user info and conversation history below to respond.
Keep responses concise. Your goal is to be helpful and make a sale.

Key info to gather:
- Shoe size
- Specific needs (e.g., wide feet)
- Preferred colors and styles
- Budget

Ask for this info if you don't have it.

Facts about the user and their conversation:
{{facts}}"#;

/// Prompt templates used by the agent.
#[derive(Debug, Clone)]
pub struct Prompts {
    pub sales_system: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            sales_system: SALES_SYSTEM.to_string(),
        }
    }
}

impl Prompts {
    /// Build prompts, preferring a configured override.
    pub fn load(sales_system: Option<&str>) -> Self {
        match sales_system {
            Some(template) if !template.trim().is_empty() => Self {
                sales_system: template.to_string(),
            },
            _ => Self::default(),
        }
    }

    /// Render the sales system prompt for one agent step.
    pub fn render_sales_system(&self, brand: &str, facts: Option<&str>) -> String {
        let mut vars = HashMap::new();
        vars.insert("brand".to_string(), brand.to_string());
        vars.insert("facts".to_string(), facts.unwrap_or(NO_FACTS).to_string());
        Self::render(&self.sales_system, &vars)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass over the template, so placeholders
    /// inside substituted values are left as they are. Unknown placeholders
    /// are kept verbatim.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match vars.get(key) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_sales_prompt_falls_back_without_facts() {
        let prompt = Prompts::default().render_sales_system("ManyBirds", None);
        assert!(prompt.starts_with("You are a skillful shoe salesperson for ManyBirds."));
        assert!(prompt.ends_with(NO_FACTS));
    }

    #[test]
    fn test_sales_prompt_includes_facts() {
        let prompt = Prompts::default()
            .render_sales_system("ManyBirds", Some("- jess wears size 8\n- jess likes blue"));
        assert!(prompt.contains("- jess wears size 8\n- jess likes blue"));
        assert!(!prompt.contains(NO_FACTS));
    }

    #[test]
    fn test_placeholders_in_facts_stay_literal() {
        let prompts = Prompts::load(Some("{{facts}} / {{brand}} / {{unknown}}"));
        for _ in 0..8 {
            let prompt = prompts.render_sales_system("ManyBirds", Some("- jess said {{brand}}"));
            assert_eq!(prompt, "- jess said {{brand}} / ManyBirds / {{unknown}}");
        }
    }

    #[test]
    fn test_blank_override_ignored() {
        assert_eq!(Prompts::load(Some("   ")).sales_system, SALES_SYSTEM);
        assert_eq!(Prompts::load(Some("Sell {{brand}}")).sales_system, "Sell {{brand}}");
    }
}
