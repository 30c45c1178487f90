//! LLM provider factory.
//!
//! Builds the completion client once at process start from the configured
//! provider name. Callers hold the result as `Arc<dyn LlmClient>` and never
//! branch on the provider again.

use crate::client::LlmClient;
use crate::providers::{AnthropicClient, BedrockClient};
use crate::types::ProviderType;
use std::sync::Arc;

/// Provider-specific inputs to the factory.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions<'a> {
    /// Custom endpoint / base URL
    pub endpoint: Option<&'a str>,

    /// API key (Anthropic) or Bedrock API key (bearer token)
    pub api_key: Option<&'a str>,

    /// AWS region, Bedrock only
    pub region: Option<&'a str>,

    /// `anthropic-version` override, Anthropic only
    pub api_version: Option<&'a str>,
}

/// Create an LLM client based on the provider name.
///
/// # Errors
/// Returns error if:
/// - Provider is unknown
/// - Required secrets are missing
pub fn create_client(
    provider: &str,
    options: ClientOptions<'_>,
) -> Result<Arc<dyn LlmClient>, String> {
    let provider_type =
        ProviderType::parse(provider).ok_or_else(|| format!("Unknown provider: {}", provider))?;

    match provider_type {
        ProviderType::Anthropic => {
            let api_key = options
                .api_key
                .ok_or_else(|| "Anthropic provider requires API key".to_string())?;
            let mut client = match options.endpoint {
                Some(endpoint) => AnthropicClient::with_base_url(endpoint, api_key),
                None => AnthropicClient::new(api_key),
            }
            .map_err(|e| e.to_string())?;
            if let Some(version) = options.api_version {
                client = client.with_api_version(version);
            }
            tracing::debug!("Created Anthropic completion client");
            Ok(Arc::new(client))
        }
        ProviderType::Bedrock => {
            let token = options
                .api_key
                .ok_or_else(|| "Bedrock provider requires a Bedrock API key".to_string())?;
            let client = match (options.endpoint, options.region) {
                (Some(endpoint), _) => BedrockClient::with_endpoint(endpoint, token),
                (None, Some(region)) => BedrockClient::new(region, token),
                (None, None) => return Err("Bedrock provider requires a region".to_string()),
            }
            .map_err(|e| e.to_string())?;
            tracing::debug!("Created Bedrock completion client");
            Ok(Arc::new(client))
        }
    }
}
