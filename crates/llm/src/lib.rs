//! Completion service crate for the claims agent.
//!
//! This crate provides a provider-agnostic abstraction over the text-completion
//! service. Providers sit behind the [`LlmClient`] trait and are selected once
//! by [`create_client`].
//!
//! # Providers
//! - **Anthropic**: Messages API
//! - **Bedrock**: Anthropic models on Amazon Bedrock
//! - **Scripted**: replayed completions for tests
//!
//! # Example
//! ```no_run
//! use claims_llm::{create_client, ClientOptions, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("anthropic", ClientOptions {
//!     api_key: Some("sk-..."),
//!     ..Default::default()
//! })?;
//! let request = LlmRequest::new("Hello, world!", "claude-sonnet-4-5-20250929");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, ClientOptions};
pub use providers::{AnthropicClient, BedrockClient, ScriptedClient, ScriptedReply};
pub use types::ProviderType;
