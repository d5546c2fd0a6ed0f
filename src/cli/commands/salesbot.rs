//! Interactive sales agent command.

use crate::agent::{ConversationState, SalesAgent, TurnEvent};
use crate::checkpoint::open_checkpointer;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::graph::{open_graph, KnowledgeGraph};
use crate::llm::OpenAIChatModel;
use crate::sales::{resolve_existing, setup_database};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

const SETUP_QUESTION: &str =
    "Do you want to run the initial database setup? (yes/no) This will wipe your database. ";

/// Run the sales agent chat.
///
/// `setup` answers the setup question up front; `None` asks interactively.
pub async fn run_salesbot(
    setup: Option<bool>,
    model: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings.graph) {
        Output::error(&format!("{}", e));
        Output::info("Run 'graphiti-tutor doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let graph = open_graph(&settings.graph)?;
    let outcome = session(graph.clone(), setup, model, &settings).await;
    let closed = graph.close().await;

    outcome?;
    closed?;
    println!("\n--- Conversation ended ---");
    Ok(())
}

async fn session(
    graph: Arc<dyn KnowledgeGraph>,
    setup: Option<bool>,
    model: Option<String>,
    settings: &Settings,
) -> Result<()> {
    let run_setup = match setup {
        Some(answer) => answer,
        None => ask_setup()?,
    };

    let state = if run_setup {
        let spinner = Output::spinner("Setting up the database...");
        let state = setup_database(graph.as_ref(), &settings.sales, &settings.products_path()).await;
        spinner.finish_and_clear();
        state?
    } else {
        resolve_existing(graph.as_ref(), &settings.sales).await?
    };

    let Some(state) = state else {
        return Ok(());
    };

    chat(graph, state, model, settings).await
}

/// Ask whether to wipe and reload the graph.
fn ask_setup() -> Result<bool> {
    println!("{}", SETUP_QUESTION);
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

async fn chat(
    graph: Arc<dyn KnowledgeGraph>,
    state: ConversationState,
    model: Option<String>,
    settings: &Settings,
) -> Result<()> {
    let model_name = model.unwrap_or_else(|| settings.llm.model.clone());
    let chat_model = Arc::new(OpenAIChatModel::new(
        &model_name,
        settings.llm.temperature,
        Duration::from_secs(settings.llm.timeout_secs),
    )?);
    let checkpointer = open_checkpointer(settings)?;
    let prompts = Prompts::load(settings.prompts.sales_system.as_deref());

    let mut agent = SalesAgent::new(chat_model, graph, checkpointer, state, &settings.sales)
        .with_prompts(prompts);

    let thread_id = Uuid::new_v4().simple().to_string();
    info!("Starting conversation thread {} with {}", thread_id, model_name);

    println!("\n--- ShoeBot is ready! ---");
    println!("Type 'exit' to end the conversation.");
    println!("Hello, how can I help you find shoes today?");

    let mut input = io::BufReader::new(io::stdin());
    converse(&mut agent, &thread_id, &mut input, &mut io::stdout()).await
}

/// Answer lines from `input` until "exit" or end of input.
///
/// Outstanding graph writes are drained however the loop ends.
async fn converse<R, W>(
    agent: &mut SalesAgent,
    thread_id: &str,
    input: &mut R,
    out: &mut W,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let outcome = chat_loop(agent, thread_id, input, out).await;

    let summary = agent.finish().await;
    let warned = if summary.failed > 0 {
        writeln!(
            out,
            "{} {} of {} conversation turn(s) could not be saved to the graph.",
            style(">>").yellow().bold(),
            summary.failed,
            summary.failed + summary.recorded
        )
    } else {
        Ok(())
    };

    outcome?;
    warned?;
    Ok(())
}

async fn chat_loop<R, W>(
    agent: &mut SalesAgent,
    thread_id: &str,
    input: &mut R,
    out: &mut W,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(out, "You: ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") {
            break;
        }

        write!(out, "Assistant: ")?;
        out.flush()?;

        let turn = agent
            .run_turn(thread_id, line, |event| {
                let shown = match event {
                    TurnEvent::Reply(text) => text.to_string(),
                    TurnEvent::ToolStarted(name) => style(format!("[{}] ", name)).dim().to_string(),
                    TurnEvent::ToolFinished { ok: true, .. } => format!("{} ", style("✓").green()),
                    TurnEvent::ToolFinished { ok: false, .. } => format!("{} ", style("✗").red()),
                };
                write!(out, "{}", shown).and_then(|_| out.flush()).ok();
            })
            .await;

        match turn {
            Ok(_) => writeln!(out)?,
            Err(e) => writeln!(out, "An error occurred: {}", e)?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemoryCheckpointer;
    use crate::config::SalesSettings;
    use crate::error::{Result as TutorResult, TutorError};
    use crate::graph::MemoryGraph;
    use crate::llm::{ChatMessage, ChatModel, ToolSpec};
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Greets every message except "fail", which errors.
    #[derive(Default)]
    struct GreetingModel {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatModel for GreetingModel {
        async fn complete(&self, messages: &[ChatMessage], _tools: &[ToolSpec]) -> TutorResult<ChatMessage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if messages.last().is_some_and(|m| m.text() == "fail") {
                return Err(TutorError::OpenAI("rate limited".to_string()));
            }
            Ok(ChatMessage::assistant("Hi there"))
        }

        fn model(&self) -> &str {
            "greeting"
        }
    }

    fn agent(model: Arc<GreetingModel>, graph: MemoryGraph) -> SalesAgent {
        SalesAgent::new(
            model,
            Arc::new(graph),
            Arc::new(MemoryCheckpointer::new()),
            ConversationState::new("jess", "user-uuid".to_string(), "brand-uuid".to_string()),
            &SalesSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_loop_skips_blanks_survives_errors_and_exits() {
        let model = Arc::new(GreetingModel::default());
        let mut bot = agent(model.clone(), MemoryGraph::new().fail_episodes());
        let mut input = Cursor::new("hello\n\n   \nfail\nExit\nnever answered\n");
        let mut out = Vec::new();

        converse(&mut bot, "t", &mut input, &mut out).await.unwrap();

        let transcript = String::from_utf8(out).unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        assert_eq!(transcript.matches("You: ").count(), 5);
        assert!(transcript.contains("Assistant: Hi there\n"));
        assert!(transcript.contains("An error occurred: OpenAI API error: rate limited"));
        assert!(transcript.contains("1 of 1 conversation turn(s) could not be saved"));
    }

    #[tokio::test]
    async fn test_end_of_input_ends_loop_after_saving() {
        let model = Arc::new(GreetingModel::default());
        let graph = Arc::new(MemoryGraph::new());
        let mut bot = SalesAgent::new(
            model.clone(),
            graph.clone(),
            Arc::new(MemoryCheckpointer::new()),
            ConversationState::new("jess", "user-uuid".to_string(), "brand-uuid".to_string()),
            &SalesSettings::default(),
        );
        let mut input = Cursor::new("I have wide feet");
        let mut out = Vec::new();

        converse(&mut bot, "t", &mut input, &mut out).await.unwrap();

        let transcript = String::from_utf8(out).unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert!(!transcript.contains("could not be saved"));
        assert_eq!(graph.ingested().len(), 1);
    }
}
