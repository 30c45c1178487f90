//! Completion provider implementations.

pub mod anthropic;
pub mod bedrock;
mod messages;
pub mod scripted;

pub use anthropic::AnthropicClient;
pub use bedrock::BedrockClient;
pub use scripted::{ScriptedClient, ScriptedReply};
