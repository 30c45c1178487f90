//! Document search stage.

use crate::services::AgentServices;
use crate::state::{AgentState, StageOutcome, StateUpdate};
use std::time::Instant;

pub async fn search_documents(services: &AgentServices, state: &AgentState) -> StageOutcome {
    let start = Instant::now();
    let result = services
        .retrieval
        .search(&state.query, services.settings.top_k)
        .await;
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(chunks) => {
            tracing::info!(
                "Retrieved {} chunks from {} engine",
                chunks.len(),
                services.retrieval.engine_name()
            );
            StageOutcome::ok(
                StateUpdate {
                    rag_chunks: Some(chunks),
                    ..Default::default()
                }
                .with_metadata("search_timing_ms", elapsed),
            )
        }
        Err(e) => {
            tracing::warn!("Document search failed: {}", e);
            StageOutcome::degraded(
                StateUpdate {
                    rag_chunks: Some(Vec::new()),
                    ..Default::default()
                }
                .with_metadata("search_timing_ms", elapsed),
                format!("Document search failed: {}", e),
            )
        }
    }
}
