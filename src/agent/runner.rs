//! The sales agent: an agent step and a tool step, looped until the model
//! stops asking for tools.

use super::recorder::{RecorderSummary, TurnRecorder};
use super::state::ConversationState;
use super::tools::{parse_tool_call, tool_definitions, ToolContext};
use crate::checkpoint::Checkpointer;
use crate::config::{Prompts, SalesSettings};
use crate::error::{Result, TutorError};
use crate::graph::{facts_block, EdgeSearch, EpisodeType, KnowledgeGraph, NewEpisode};
use crate::llm::{ChatMessage, ChatModel, ToolSpec};
use std::sync::Arc;
use tracing::{debug, info};

/// Speaker label for the agent in stored conversation turns.
pub const AGENT_NAME: &str = "SalesBot";

/// Where to go after the agent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The model asked for tools: run them, then return to the agent.
    Continue,
    /// The model answered: the turn is over.
    End,
}

/// Decide whether the last assistant message needs the tool step.
pub fn should_continue(history: &[ChatMessage]) -> Route {
    match history.last() {
        Some(message) if !message.tool_calls().is_empty() => Route::Continue,
        _ => Route::End,
    }
}

/// Progress reported while a turn runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent<'a> {
    /// Assistant text, as soon as the model produces it.
    Reply(&'a str),
    /// A tool is about to run.
    ToolStarted(&'a str),
    /// A tool finished; `ok` is false when it failed and the failure was
    /// handed to the model instead.
    ToolFinished { name: &'a str, ok: bool },
}

/// Summary of one completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Text of the final assistant message.
    pub reply: String,
    /// Agent and tool steps taken.
    pub steps: usize,
    pub tool_calls: usize,
}

/// Conversational sales agent grounded in the knowledge graph.
pub struct SalesAgent {
    model: Arc<dyn ChatModel>,
    graph: Arc<dyn KnowledgeGraph>,
    checkpointer: Arc<dyn Checkpointer>,
    tools: ToolContext,
    tool_specs: Vec<ToolSpec>,
    prompts: Prompts,
    state: ConversationState,
    brand: String,
    context_facts: usize,
    recursion_limit: usize,
    recorder: TurnRecorder,
}

impl SalesAgent {
    /// Create an agent for a resolved conversation.
    pub fn new(
        model: Arc<dyn ChatModel>,
        graph: Arc<dyn KnowledgeGraph>,
        checkpointer: Arc<dyn Checkpointer>,
        state: ConversationState,
        settings: &SalesSettings,
    ) -> Self {
        Self {
            tools: ToolContext::new(graph.clone(), &state.brand_node_uuid, settings.tool_facts),
            tool_specs: tool_definitions(),
            recorder: TurnRecorder::new(graph.clone()),
            model,
            graph,
            checkpointer,
            prompts: Prompts::default(),
            state,
            brand: settings.brand.clone(),
            context_facts: settings.context_facts,
            recursion_limit: settings.recursion_limit,
        }
    }

    /// Use custom prompt templates.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Run one user turn on `thread_id`, reporting progress through `on_event`.
    pub async fn run_turn<F>(
        &mut self,
        thread_id: &str,
        user_input: &str,
        mut on_event: F,
    ) -> Result<TurnOutcome>
    where
        F: FnMut(TurnEvent<'_>),
    {
        let earlier = self.recorder.reap();
        if earlier.failed > 0 {
            debug!("{} earlier turn(s) failed to persist", earlier.failed);
        }

        let mut history = self.checkpointer.load(thread_id).await?;
        history.push(ChatMessage::user(user_input));

        let mut steps = 0;
        let mut tool_calls = 0;

        loop {
            steps += 1;
            self.check_recursion(steps)?;

            let reply = self.chatbot(&history).await?;
            if !reply.text().is_empty() {
                on_event(TurnEvent::Reply(reply.text()));
            }
            history.push(reply);
            self.checkpointer.save(thread_id, &history).await?;

            match should_continue(&history) {
                Route::End => break,
                Route::Continue => {
                    steps += 1;
                    self.check_recursion(steps)?;
                    tool_calls += self.run_tools(&mut history, &mut on_event).await;
                    self.checkpointer.save(thread_id, &history).await?;
                }
            }
        }

        let reply = history
            .last()
            .map(|m| m.text().to_string())
            .unwrap_or_default();

        Ok(TurnOutcome {
            reply,
            steps,
            tool_calls,
        })
    }

    /// Wait for background writes to finish. Call before closing the graph.
    pub async fn finish(&mut self) -> RecorderSummary {
        self.recorder.drain().await
    }

    fn check_recursion(&self, steps: usize) -> Result<()> {
        if steps > self.recursion_limit {
            return Err(TutorError::Agent(format!(
                "Recursion limit of {} reached without hitting a stop condition",
                self.recursion_limit
            )));
        }
        Ok(())
    }

    /// Agent step: retrieve context, call the model, persist the exchange.
    async fn chatbot(&mut self, history: &[ChatMessage]) -> Result<ChatMessage> {
        info!("Chatbot node is executing.");

        let facts = match history.last() {
            Some(last) => {
                let speaker = if last.is_assistant() {
                    AGENT_NAME
                } else {
                    self.state.user_name.as_str()
                };
                let query = format!("{}: {}", speaker, last.text());
                let search = EdgeSearch::new(query)
                    .with_center(self.state.user_node_uuid.as_str())
                    .with_num_results(self.context_facts);
                let facts = facts_block(&self.graph.search(&search).await?);
                info!(
                    "Retrieved facts for context:\n{}",
                    facts.as_deref().unwrap_or("(none)")
                );
                facts
            }
            None => None,
        };

        let system = self
            .prompts
            .render_sales_system(&self.brand, facts.as_deref());
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(system));
        messages.extend(history.iter().cloned());

        let reply = self.model.complete(&messages, &self.tool_specs).await?;
        info!("LLM generated response: {}", reply.text());

        let last_text = history.last().map(|m| m.text()).unwrap_or_default();
        self.recorder.record(NewEpisode::new(
            "Chatbot Response",
            format!(
                "{}: {}\n{}: {}",
                self.state.user_name,
                last_text,
                AGENT_NAME,
                reply.text()
            ),
            EpisodeType::Message,
            "Chatbot",
        ));

        Ok(reply)
    }

    /// Tool step: run every call in the last assistant message. Returns how
    /// many calls ran.
    async fn run_tools<F>(&self, history: &mut Vec<ChatMessage>, on_event: &mut F) -> usize
    where
        F: FnMut(TurnEvent<'_>),
    {
        let calls = history
            .last()
            .map(|m| m.tool_calls().to_vec())
            .unwrap_or_default();

        for call in &calls {
            info!("Agent calling tool: {} with args: {}", call.name, call.arguments);
            on_event(TurnEvent::ToolStarted(&call.name));

            let outcome = match parse_tool_call(&call.name, &call.arguments) {
                Ok(tool) => self.tools.execute(&tool).await,
                Err(e) => Err(e),
            };
            let (result, ok) = match outcome {
                Ok(output) => (output, true),
                Err(e) => (format!("Tool error: {}", e), false),
            };

            on_event(TurnEvent::ToolFinished {
                name: &call.name,
                ok,
            });
            history.push(ChatMessage::tool(call.id.clone(), result));
        }

        calls.len()
    }
}
