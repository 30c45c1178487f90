//! Amazon Bedrock provider for Anthropic models.
//!
//! Uses the Bedrock runtime `InvokeModel` endpoint with a Bedrock API key sent
//! as a bearer token, so no SigV4 signing is needed.

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use crate::providers::messages::{http_client, status_error, MessagesRequest, MessagesResponse};
use claims_core::{AppError, AppResult};

pub const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Bedrock runtime completion client.
pub struct BedrockClient {
    /// Runtime endpoint, e.g. https://bedrock-runtime.us-east-1.amazonaws.com
    endpoint: String,

    /// Bedrock API key
    bearer_token: String,

    /// HTTP client
    client: reqwest::Client,
}

impl BedrockClient {
    /// Create a client for the regional runtime endpoint.
    pub fn new(region: &str, bearer_token: impl Into<String>) -> AppResult<Self> {
        Self::with_endpoint(
            format!("https://bedrock-runtime.{}.amazonaws.com", region),
            bearer_token,
        )
    }

    /// Create a client against an explicit endpoint (VPC endpoints, tests).
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        bearer_token: impl Into<String>,
    ) -> AppResult<Self> {
        let client = http_client("Bedrock")?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bearer_token: bearer_token.into(),
            client,
        })
    }

    fn invoke_url(&self, model_id: &str) -> String {
        format!("{}/model/{}/invoke", self.endpoint, encode_model_id(model_id))
    }
}

/// Percent-encode the characters inference-profile ids and ARNs carry.
fn encode_model_id(model_id: &str) -> String {
    model_id.replace(':', "%3A").replace('/', "%2F")
}

#[async_trait::async_trait]
impl LlmClient for BedrockClient {
    fn provider_name(&self) -> &str {
        "bedrock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(model = %request.model, "Sending completion request to Bedrock");

        let body = MessagesRequest::for_bedrock(request, BEDROCK_ANTHROPIC_VERSION);

        let response = self
            .client
            .post(self.invoke_url(&request.model))
            .bearer_auth(&self.bearer_token)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Bedrock: {}", e)))?;

        if !response.status().is_success() {
            return Err(status_error("Bedrock", response).await);
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Bedrock response: {}", e)))?;

        parsed.into_llm_response(&request.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regional_invoke_url() {
        let client = BedrockClient::new("us-east-1", "token").unwrap();
        assert_eq!(client.provider_name(), "bedrock");
        assert_eq!(
            client.invoke_url("us.anthropic.claude-sonnet-4-5-20250929-v1:0"),
            "https://bedrock-runtime.us-east-1.amazonaws.com/model/us.anthropic.claude-sonnet-4-5-20250929-v1%3A0/invoke"
        );
    }

    #[test]
    fn test_arn_model_id_is_encoded() {
        assert_eq!(
            encode_model_id("arn:aws:bedrock:us-east-1:123:inference-profile/x"),
            "arn%3Aaws%3Abedrock%3Aus-east-1%3A123%3Ainference-profile%2Fx"
        );
    }
}
