//! Progress events emitted while a query runs.

use crate::response::AgentResponse;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Orchestrator graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Classify,
    GenerateSql,
    ExecuteQuery,
    FixSql,
    SearchDocuments,
    Synthesize,
}

impl Node {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classify => "classify",
            Self::GenerateSql => "generate_sql",
            Self::ExecuteQuery => "execute_query",
            Self::FixSql => "fix_sql",
            Self::SearchDocuments => "search_documents",
            Self::Synthesize => "synthesize",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    Running,
    Complete,
    Error,
}

/// One record of the event stream. Serializes with an `event` tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    Trace {
        node: Node,
        status: TraceStatus,
        #[serde(rename = "timingMs", skip_serializing_if = "Option::is_none")]
        timing_ms: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    AnswerChunk {
        text: String,
    },
    Complete {
        response: Box<AgentResponse>,
    },
}

impl AgentEvent {
    pub(crate) fn running(node: Node) -> Self {
        Self::Trace {
            node,
            status: TraceStatus::Running,
            timing_ms: None,
            message: None,
        }
    }

    pub(crate) fn finished(node: Node, timing_ms: f64) -> Self {
        Self::Trace {
            node,
            status: TraceStatus::Complete,
            timing_ms: Some(timing_ms),
            message: None,
        }
    }

    pub(crate) fn failed(node: Node, message: impl Into<String>) -> Self {
        Self::Trace {
            node,
            status: TraceStatus::Error,
            timing_ms: None,
            message: Some(message.into()),
        }
    }
}

/// Per-visit record kept in the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    pub node: Node,
    pub status: TraceStatus,
    pub timing_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
