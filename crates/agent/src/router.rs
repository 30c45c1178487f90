//! Intent classification.

use crate::output::extract_json_object;
use crate::services::AgentServices;
use crate::state::{AgentState, Intent, StageOutcome, StateUpdate};
use claims_core::AppResult;
use claims_prompt::{vars, ROUTER_CLASSIFY};
use serde_json::Value;
use std::time::Instant;

const CLASSIFY_MAX_TOKENS: u32 = 512;

/// Shown to the classifier when no document has been ingested.
pub const NO_DOCUMENTS: &str = "No documents loaded.";

/// Decision parsed from a classifier completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub intent: Intent,
    pub reasoning: Option<String>,
}

/// Read `{"intent": ..., "reasoning": ...}` out of a completion.
///
/// Returns `None` when there is no object or the intent is not one of the
/// three known labels.
pub fn parse_classification(text: &str) -> Option<Classification> {
    let object = extract_json_object(text)?;
    let intent = object.get("intent").and_then(Value::as_str).and_then(Intent::parse)?;
    let reasoning = object
        .get("reasoning")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(Classification { intent, reasoning })
}

/// Classify the query. Never fails: anything unusable becomes `clarify`.
pub async fn classify(services: &AgentServices, state: &AgentState) -> StageOutcome {
    let start = Instant::now();
    let result = request_classification(services, &state.query).await;
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;

    let (classification, degraded) = match result {
        Ok(text) => match parse_classification(&text) {
            Some(classification) => (classification, None),
            None => {
                tracing::warn!("Classifier reply had no usable intent, defaulting to clarify");
                (
                    Classification {
                        intent: Intent::Clarify,
                        reasoning: None,
                    },
                    Some("Could not parse an intent from the classifier reply".to_string()),
                )
            }
        },
        Err(e) => {
            tracing::warn!("Classification failed: {}", e);
            (
                Classification {
                    intent: Intent::Clarify,
                    reasoning: None,
                },
                Some(format!("Classification failed: {}", e)),
            )
        }
    };

    tracing::info!("Classified query as {}", classification.intent);

    let mut update = StateUpdate {
        intent: Some(classification.intent),
        ..Default::default()
    }
    .with_metadata("classify_timing_ms", elapsed);
    if let Some(reasoning) = classification.reasoning {
        update = update.with_metadata("classify_reasoning", reasoning);
    }

    StageOutcome { update, degraded }
}

async fn request_classification(services: &AgentServices, query: &str) -> AppResult<String> {
    let names = services.retrieval.list_documents();
    let documents = if names.is_empty() {
        NO_DOCUMENTS.to_string()
    } else {
        names.into_iter().collect::<Vec<_>>().join(", ")
    };

    let prompt = services.prompts.render(
        ROUTER_CLASSIFY,
        &vars([
            ("query", query.to_string()),
            ("schema", services.tabular.describe_schema()),
            ("documents", documents),
        ]),
    )?;

    services.complete(prompt, CLASSIFY_MAX_TOKENS, Some(0.0)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_intents() {
        let parsed =
            parse_classification(r#"{"intent": "nl2sql", "reasoning": "asks for a total"}"#)
                .unwrap();
        assert_eq!(parsed.intent, Intent::Nl2sql);
        assert_eq!(parsed.reasoning.as_deref(), Some("asks for a total"));

        let fenced = "```json\n{\"intent\": \"RAG\"}\n```";
        let parsed = parse_classification(fenced).unwrap();
        assert_eq!(parsed.intent, Intent::Rag);
        assert!(parsed.reasoning.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_or_missing_intent() {
        assert!(parse_classification(r#"{"intent": "weather"}"#).is_none());
        assert!(parse_classification(r#"{"reasoning": "unsure"}"#).is_none());
        assert!(parse_classification(r#"{"intent": 3}"#).is_none());
        assert!(parse_classification("nl2sql").is_none());
    }
}
