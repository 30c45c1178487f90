//! Query orchestration.
//!
//! A run walks the node graph from `classify` to `synthesize`:
//!
//! ```text
//! classify ─┬─ nl2sql ─> generate_sql ─┬─> execute_query ─┬─> synthesize
//!           │                          │        ^         │
//!           │                          │        └ fix_sql <┘ (error, retries left)
//!           │                          └─ no sql ──────────> synthesize
//!           ├─ rag ────> search_documents ─────────────────> synthesize
//!           └─ clarify ────────────────────────────────────> synthesize
//! ```
//!
//! Stages never fail a run; a degraded stage is recorded in the trace and the
//! graph moves on.

use crate::conversation::ConversationTurn;
use crate::events::{AgentEvent, Node, TraceEntry, TraceStatus};
use crate::response::AgentResponse;
use crate::services::AgentServices;
use crate::state::{AgentState, Intent, StageOutcome};
use crate::{retrieval, router, sql, synthesis};
use claims_core::AgentSettings;
use futures::Stream;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::Instrument;

/// Characters per `answer_chunk` event.
pub const ANSWER_SLICE_CHARS: usize = 20;

const EVENT_BUFFER: usize = 64;

#[derive(Clone)]
pub struct Orchestrator {
    services: Arc<AgentServices>,
}

impl Orchestrator {
    pub fn new(services: AgentServices) -> Self {
        Self {
            services: Arc::new(services),
        }
    }

    pub fn services(&self) -> &AgentServices {
        &self.services
    }

    /// Answer one query without progress events.
    pub async fn run(
        &self,
        query: impl Into<String>,
        history: Vec<ConversationTurn>,
    ) -> AgentResponse {
        let span = run_span();
        drive(&self.services, query.into(), history, None)
            .instrument(span)
            .await
    }

    /// Answer one query as a stream of progress events ending in `complete`.
    ///
    /// The run happens on a spawned task, so this must be called inside a
    /// Tokio runtime. Dropping the stream stops the run before its next
    /// stage.
    pub fn stream(
        &self,
        query: impl Into<String>,
        history: Vec<ConversationTurn>,
    ) -> impl Stream<Item = AgentEvent> + Send + 'static {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let services = Arc::clone(&self.services);
        let query = query.into();

        tokio::spawn(
            async move {
                let response = drive(&services, query, history, Some(&tx)).await;
                let complete = AgentEvent::Complete {
                    response: Box::new(response),
                };
                if tx.send(complete).await.is_err() {
                    tracing::debug!("Stream closed before the complete event");
                }
            }
            .instrument(run_span()),
        );

        futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
    }
}

fn run_span() -> tracing::Span {
    tracing::info_span!("agent_run", run_id = %uuid::Uuid::new_v4())
}

/// Pick the node that follows `current`, or `None` once the run is done.
pub fn next_node(current: Node, state: &AgentState, settings: &AgentSettings) -> Option<Node> {
    match current {
        Node::Classify => Some(match state.intent() {
            Intent::Nl2sql => Node::GenerateSql,
            Intent::Rag => Node::SearchDocuments,
            Intent::Clarify => Node::Synthesize,
        }),
        Node::GenerateSql if state.sql.is_none() => Some(Node::Synthesize),
        Node::GenerateSql => Some(Node::ExecuteQuery),
        Node::ExecuteQuery
            if state.sql.is_some()
                && state.sql_error.is_some()
                && state.sql_retry_count < settings.sql_max_retries =>
        {
            Some(Node::FixSql)
        }
        Node::ExecuteQuery => Some(Node::Synthesize),
        Node::FixSql => Some(Node::ExecuteQuery),
        Node::SearchDocuments => Some(Node::Synthesize),
        Node::Synthesize => None,
    }
}

async fn run_node(node: Node, services: &AgentServices, state: &AgentState) -> StageOutcome {
    match node {
        Node::Classify => router::classify(services, state).await,
        Node::GenerateSql => sql::generate_sql(services, state).await,
        Node::ExecuteQuery => sql::execute_query(services, state).await,
        Node::FixSql => sql::fix_sql(services, state).await,
        Node::SearchDocuments => retrieval::search_documents(services, state).await,
        Node::Synthesize => synthesis::synthesize(services, state).await,
    }
}

/// Send an event when a sink is attached. Returns false once the consumer is gone.
async fn emit(sink: Option<&mpsc::Sender<AgentEvent>>, event: AgentEvent) -> bool {
    match sink {
        Some(tx) => tx.send(event).await.is_ok(),
        None => true,
    }
}

fn is_cancelled(sink: Option<&mpsc::Sender<AgentEvent>>) -> bool {
    sink.is_some_and(|tx| tx.is_closed())
}

/// Split an answer into fixed-size character slices.
pub fn answer_slices(answer: &str) -> Vec<String> {
    let chars: Vec<char> = answer.chars().collect();
    chars
        .chunks(ANSWER_SLICE_CHARS)
        .map(|slice| slice.iter().collect())
        .collect()
}

async fn drive(
    services: &AgentServices,
    query: String,
    history: Vec<ConversationTurn>,
    sink: Option<&mpsc::Sender<AgentEvent>>,
) -> AgentResponse {
    let run_start = Instant::now();
    tracing::info!("Processing query: {}", query);

    let mut state = AgentState::new(query, history);
    let mut trace = Vec::new();
    let mut next = Some(Node::Classify);

    while let Some(node) = next {
        if is_cancelled(sink) || !emit(sink, AgentEvent::running(node)).await {
            tracing::info!("Run cancelled before {}", node);
            return finish(state, trace, run_start);
        }

        let start = Instant::now();
        let outcome = run_node(node, services, &state).await;
        let timing_ms = start.elapsed().as_secs_f64() * 1000.0;
        state.apply(outcome.update);

        let status = if outcome.degraded.is_some() {
            TraceStatus::Error
        } else {
            TraceStatus::Complete
        };
        tracing::debug!("Node {} finished in {:.1}ms ({:?})", node, timing_ms, status);
        trace.push(TraceEntry {
            node,
            status,
            timing_ms,
            message: outcome.degraded.clone(),
        });

        if let Some(message) = outcome.degraded {
            emit(sink, AgentEvent::failed(node, message)).await;
        }
        emit(sink, AgentEvent::finished(node, timing_ms)).await;

        next = next_node(node, &state, &services.settings);
    }

    if sink.is_some() {
        for text in answer_slices(&state.answer) {
            if is_cancelled(sink) || !emit(sink, AgentEvent::AnswerChunk { text }).await {
                tracing::info!("Run cancelled while streaming the answer");
                break;
            }
        }
    }

    finish(state, trace, run_start)
}

fn finish(state: AgentState, trace: Vec<TraceEntry>, run_start: Instant) -> AgentResponse {
    let timing_ms = run_start.elapsed().as_millis() as u64;
    tracing::info!(
        "Query finished as {} in {}ms after {} nodes",
        state.intent(),
        timing_ms,
        trace.len()
    );
    AgentResponse::from_state(state, trace, timing_ms)
}
