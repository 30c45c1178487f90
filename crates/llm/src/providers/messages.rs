//! Anthropic Messages wire format, shared by the Anthropic and Bedrock providers.
//!
//! Both endpoints accept the same request body (Bedrock adds
//! `anthropic_version` to the body and takes the model from the URL) and
//! return the same response shape.

use crate::client::{LlmRequest, LlmResponse, LlmUsage};
use claims_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_version: Option<String>,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Message {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireUsage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

impl MessagesRequest {
    /// Build the body for the direct Messages API (model in the body).
    pub fn for_messages_api(request: &LlmRequest) -> Self {
        Self {
            model: Some(request.model.clone()),
            anthropic_version: None,
            ..Self::base(request)
        }
    }

    /// Build the body for Bedrock `invoke` (model in the URL).
    pub fn for_bedrock(request: &LlmRequest, anthropic_version: &str) -> Self {
        Self {
            model: None,
            anthropic_version: Some(anthropic_version.to_string()),
            ..Self::base(request)
        }
    }

    fn base(request: &LlmRequest) -> Self {
        Self {
            model: None,
            anthropic_version: None,
            max_tokens: request.max_tokens_or_default(),
            messages: vec![Message {
                role: "user",
                content: request.prompt.clone(),
            }],
            system: request.system.clone(),
            temperature: request.temperature,
        }
    }
}

impl MessagesResponse {
    /// Concatenate the text blocks into one completion.
    pub fn into_llm_response(self, fallback_model: &str) -> AppResult<LlmResponse> {
        let content: String = self
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() && self.stop_reason.as_deref() != Some("end_turn") {
            return Err(AppError::Llm(format!(
                "Completion contained no text (stop_reason: {})",
                self.stop_reason.as_deref().unwrap_or("unknown")
            )));
        }

        let usage = self
            .usage
            .map(|u| LlmUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: self.model.unwrap_or_else(|| fallback_model.to_string()),
            usage,
            stop_reason: self.stop_reason,
        })
    }
}

/// HTTP client with the request timeout both providers use.
pub(crate) fn http_client(provider: &str) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| AppError::Llm(format!("Failed to build {} HTTP client: {}", provider, e)))
}

/// Turn a non-success HTTP response into an `AppError::Llm`.
pub(crate) async fn status_error(provider: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    AppError::Llm(format!("{} API error ({}): {}", provider, status, error_text))
}
