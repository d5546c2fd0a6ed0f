//! Configuration module for graphiti-tutor.
//!
//! Handles loading application settings (file + environment) and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, NO_FACTS};
pub use settings::{
    CheckpointProvider, CheckpointSettings, GraphProvider, GraphSettings, LlmSettings,
    PromptSettings, SalesSettings, Settings,
};
