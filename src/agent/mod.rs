//! Sales agent with graph-backed memory and a product lookup tool.
//!
//! Each user turn alternates between an agent step (retrieve facts about the
//! user, ask the model) and a tool step (run the product lookups the model
//! requested) until the model answers in plain text.

mod recorder;
mod runner;
mod state;
mod tools;

pub use recorder::{RecorderSummary, TurnRecorder};
pub use runner::{should_continue, Route, SalesAgent, TurnEvent, TurnOutcome, AGENT_NAME};
pub use state::ConversationState;
pub use tools::{parse_tool_call, tool_definitions, ToolCall, ToolContext, GET_SHOE_DATA};
