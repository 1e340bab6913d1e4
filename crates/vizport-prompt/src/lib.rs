//! Prompt text for vizport.
//!
//! * [`builder::PromptBuilder`] composes markdown fragments fluently.
//! * [`system::VisualizationPrompt`] is the structured default system prompt
//!   that tells the model which chart and display components exist.

pub mod builder;
pub mod system;

pub use builder::PromptBuilder;
pub use system::{Component, VisualizationPrompt, default_system_prompt};
