//! Prompt system for the claims agent.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions, built in and overridable per workspace
//! - Handlebars template rendering
//! - Declared-input checking

pub mod builder;
pub mod library;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use library::{
    vars, PromptLibrary, ANSWER_RAG, ANSWER_SYNTHESIZE, ROUTER_CLASSIFY, SQL_GENERATE, SQL_REPAIR,
};
pub use loader::{list_prompts, load_prompt, parse_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptSource};
