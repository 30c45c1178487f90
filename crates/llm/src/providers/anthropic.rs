//! Anthropic Messages API provider.
//!
//! API: https://docs.anthropic.com/en/api/messages

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use crate::providers::messages::{http_client, status_error, MessagesRequest, MessagesResponse};
use claims_core::{AppError, AppResult};

pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Anthropic completion client.
pub struct AnthropicClient {
    /// Base URL for the API
    base_url: String,

    /// Sent as `x-api-key`
    api_key: String,

    /// Sent as `anthropic-version`
    api_version: String,

    /// HTTP client
    client: reqwest::Client,
}

impl AnthropicClient {
    /// Create a client against the public endpoint.
    pub fn new(api_key: impl Into<String>) -> AppResult<Self> {
        Self::with_base_url(DEFAULT_ANTHROPIC_URL, api_key)
    }

    /// Create a client against a custom base URL (proxies, gateways).
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> AppResult<Self> {
        let client = http_client("Anthropic")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            client,
        })
    }

    /// Override the `anthropic-version` header.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(model = %request.model, "Sending completion request to Anthropic");

        let body = MessagesRequest::for_messages_api(request);

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Anthropic: {}", e)))?;

        if !response.status().is_success() {
            return Err(status_error("Anthropic", response).await);
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Anthropic response: {}", e)))?;

        let completion = parsed.into_llm_response(&request.model)?;
        tracing::debug!(
            completion_tokens = completion.usage.completion_tokens,
            "Received completion from Anthropic"
        );
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anthropic_client_creation() {
        let client = AnthropicClient::new("sk-test").unwrap();
        assert_eq!(client.provider_name(), "anthropic");
        assert_eq!(client.messages_url(), "https://api.anthropic.com/v1/messages");
        assert_eq!(client.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn test_custom_base_url_trims_slash() {
        let client = AnthropicClient::with_base_url("http://localhost:8080/", "sk-test")
            .unwrap()
            .with_api_version("2024-01-01");
        assert_eq!(client.messages_url(), "http://localhost:8080/v1/messages");
        assert_eq!(client.api_version, "2024-01-01");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_llm_error() {
        let client = AnthropicClient::with_base_url("http://127.0.0.1:9", "sk-test").unwrap();
        let result = client.complete(&LlmRequest::new("hi", "claude-x")).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }
}
