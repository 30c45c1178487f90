//! The record returned at the end of a run.

use crate::events::{Node, TraceEntry};
use crate::state::{AgentState, ChartType, Citation, Intent, Metadata};
use claims_tabular::Row;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub intent: Intent,
    pub answer: String,
    pub sql: Option<String>,
    pub sql_error: Option<String>,
    pub query_results: Option<Vec<Row>>,
    pub chart_type: Option<ChartType>,
    pub citations: Option<Vec<Citation>>,
    pub agent_trace: Vec<TraceEntry>,
    pub timing_ms: u64,
    pub sql_retries: u32,
    pub metadata: Metadata,
}

impl AgentResponse {
    pub(crate) fn from_state(state: AgentState, agent_trace: Vec<TraceEntry>, timing_ms: u64) -> Self {
        let intent = state.intent();
        Self {
            intent,
            answer: state.answer,
            sql: state.sql,
            sql_error: state.sql_error,
            query_results: state.query_results,
            chart_type: state.chart_type,
            citations: state.citations,
            agent_trace,
            timing_ms,
            sql_retries: state.sql_retry_count,
            metadata: state.metadata,
        }
    }

    /// Number of times a node ran.
    pub fn visits(&self, node: Node) -> usize {
        self.agent_trace.iter().filter(|t| t.node == node).count()
    }
}
