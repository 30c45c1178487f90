//! Scripted completion client.
//!
//! Replays a fixed sequence of completions or failures and records every
//! prompt it receives. Used as the test double for pipeline stages and the
//! orchestrator, where call order is deterministic.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use claims_core::{AppError, AppResult};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Failure(String),
}

/// Completion client that answers from a script.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<ScriptedReply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a client from completions returned in order.
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for text in texts {
            client.push_text(text);
        }
        client
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.replies.lock().push_back(ScriptedReply::Text(text.into()));
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .push_back(ScriptedReply::Failure(message.into()));
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().push(request.prompt.clone());

        let reply = self.replies.lock().pop_front();
        match reply {
            Some(ScriptedReply::Text(content)) => Ok(LlmResponse {
                content,
                model: request.model.clone(),
                usage: LlmUsage::default(),
                stop_reason: Some("end_turn".to_string()),
            }),
            Some(ScriptedReply::Failure(message)) => Err(AppError::Llm(message)),
            None => Err(AppError::Llm("Scripted client has no replies left".to_string())),
        }
    }
}
