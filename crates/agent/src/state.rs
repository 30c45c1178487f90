//! Per-query agent state and the partial updates stages return.

use crate::conversation::ConversationTurn;
use claims_retrieval::DocumentChunk;
use claims_tabular::Row;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Length of the text preview kept in a citation, in characters.
pub const CITATION_PREVIEW_CHARS: usize = 200;

/// Classified purpose of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Nl2sql,
    Rag,
    #[default]
    Clarify,
}

impl Intent {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "nl2sql" => Some(Self::Nl2sql),
            "rag" => Some(Self::Rag),
            "clarify" => Some(Self::Clarify),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nl2sql => "nl2sql",
            Self::Rag => "rag",
            Self::Clarify => "clarify",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suggested visualization for tabular results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
}

/// Diagnostic value recorded by a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Number(f64),
    Text(String),
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// Source reference shown with a document answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub text: String,
    pub page: u32,
    pub doc_name: String,
    pub score: f64,
}

impl Citation {
    pub fn from_chunk(chunk: &DocumentChunk) -> Self {
        Self {
            text: chunk.text.chars().take(CITATION_PREVIEW_CHARS).collect(),
            page: chunk.page,
            doc_name: chunk.doc_name.clone(),
            score: chunk.score,
        }
    }
}

/// The record threaded through one query.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentState {
    pub query: String,
    intent: Option<Intent>,
    pub sql: Option<String>,
    pub sql_error: Option<String>,
    pub sql_retry_count: u32,
    pub query_results: Option<Vec<Row>>,
    pub rag_chunks: Option<Vec<DocumentChunk>>,
    pub answer: String,
    pub chart_type: Option<ChartType>,
    pub citations: Option<Vec<Citation>>,
    pub metadata: Metadata,
    #[serde(skip)]
    pub conversation_history: Vec<ConversationTurn>,
}

impl AgentState {
    pub fn new(query: impl Into<String>, conversation_history: Vec<ConversationTurn>) -> Self {
        Self {
            query: query.into(),
            conversation_history,
            ..Self::default()
        }
    }

    /// Classified intent, `clarify` until classification has run.
    pub fn intent(&self) -> Intent {
        self.intent.unwrap_or_default()
    }

    /// Merge a stage's update.
    ///
    /// Only fields present in the update change; metadata entries are added
    /// or overwritten key by key. The intent is set at most once.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(intent) = update.intent {
            match self.intent {
                None => self.intent = Some(intent),
                Some(current) if current != intent => {
                    tracing::debug!("Ignoring intent change {} -> {}", current, intent);
                }
                Some(_) => {}
            }
        }
        if let Some(sql) = update.sql {
            self.sql = sql;
        }
        if let Some(sql_error) = update.sql_error {
            self.sql_error = sql_error;
        }
        if let Some(count) = update.sql_retry_count {
            self.sql_retry_count = count;
        }
        if let Some(results) = update.query_results {
            self.query_results = results;
        }
        if let Some(chunks) = update.rag_chunks {
            self.rag_chunks = Some(chunks);
        }
        if let Some(answer) = update.answer {
            self.answer = answer;
        }
        if let Some(chart_type) = update.chart_type {
            self.chart_type = chart_type;
        }
        if let Some(citations) = update.citations {
            self.citations = citations;
        }
        self.metadata.extend(update.metadata);
    }
}

/// Fields a stage computed. `None` leaves the state field untouched; for
/// nullable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub intent: Option<Intent>,
    pub sql: Option<Option<String>>,
    pub sql_error: Option<Option<String>>,
    pub sql_retry_count: Option<u32>,
    pub query_results: Option<Option<Vec<Row>>>,
    pub rag_chunks: Option<Vec<DocumentChunk>>,
    pub answer: Option<String>,
    pub chart_type: Option<Option<ChartType>>,
    pub citations: Option<Option<Vec<Citation>>>,
    pub metadata: Metadata,
}

impl StateUpdate {
    pub fn with_metadata(mut self, key: &str, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// What a stage hands back to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct StageOutcome {
    pub update: StateUpdate,

    /// Set when the stage fell back instead of doing its job
    pub degraded: Option<String>,
}

impl StageOutcome {
    pub fn ok(update: StateUpdate) -> Self {
        Self {
            update,
            degraded: None,
        }
    }

    pub fn degraded(update: StateUpdate, reason: impl Into<String>) -> Self {
        Self {
            update,
            degraded: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intent_parse_and_serde() {
        assert_eq!(Intent::parse(" RAG "), Some(Intent::Rag));
        assert_eq!(Intent::parse("sql"), None);
        assert_eq!(serde_json::to_value(Intent::Nl2sql).unwrap(), json!("nl2sql"));
        assert_eq!(AgentState::default().intent(), Intent::Clarify);
    }

    #[test]
    fn test_intent_is_set_once() {
        let mut state = AgentState::new("q", Vec::new());
        state.apply(StateUpdate {
            intent: Some(Intent::Rag),
            ..Default::default()
        });
        state.apply(StateUpdate {
            intent: Some(Intent::Nl2sql),
            ..Default::default()
        });
        assert_eq!(state.intent(), Intent::Rag);
    }

    #[test]
    fn test_apply_leaves_untouched_fields() {
        let mut state = AgentState::new("q", Vec::new());
        state.apply(StateUpdate {
            sql: Some(Some("SELECT 1".to_string())),
            sql_error: Some(Some("boom".to_string())),
            sql_retry_count: Some(1),
            ..Default::default()
        });
        state.apply(StateUpdate::default().with_metadata("execute_timing_ms", 2.0));

        assert_eq!(state.sql.as_deref(), Some("SELECT 1"));
        assert_eq!(state.sql_error.as_deref(), Some("boom"));
        assert_eq!(state.sql_retry_count, 1);

        state.apply(StateUpdate {
            sql_error: Some(None),
            ..Default::default()
        });
        assert!(state.sql_error.is_none());
        assert_eq!(state.sql.as_deref(), Some("SELECT 1"));
    }

    #[test]
    fn test_metadata_merges_additively() {
        let mut state = AgentState::new("q", Vec::new());
        state.apply(
            StateUpdate::default()
                .with_metadata("classify_timing_ms", 12.5)
                .with_metadata("classify_reasoning", "aggregate"),
        );
        state.apply(StateUpdate::default().with_metadata("synthesize_timing_ms", 3.0));

        assert_eq!(state.metadata.len(), 3);
        assert_eq!(
            serde_json::to_value(&state.metadata).unwrap(),
            json!({
                "classify_reasoning": "aggregate",
                "classify_timing_ms": 12.5,
                "synthesize_timing_ms": 3.0
            })
        );
    }

    #[test]
    fn test_citation_preview_is_char_safe() {
        let chunk = DocumentChunk {
            text: "é".repeat(250),
            page: 4,
            doc_name: "plan".to_string(),
            score: 1.5,
        };
        let citation = Citation::from_chunk(&chunk);
        assert_eq!(citation.text.chars().count(), CITATION_PREVIEW_CHARS);
        assert_eq!(citation.page, 4);
        assert_eq!(serde_json::to_value(&citation).unwrap()["docName"], json!("plan"));
    }
}
