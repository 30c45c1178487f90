//! Final answer synthesis.

use crate::conversation::render_history;
use crate::services::AgentServices;
use crate::state::{AgentState, ChartType, Citation, Intent, StageOutcome, StateUpdate};
use claims_core::AppResult;
use claims_llm::client::DEFAULT_MAX_TOKENS;
use claims_prompt::{vars, ANSWER_RAG, ANSWER_SYNTHESIZE};
use claims_retrieval::DocumentChunk;
use claims_tabular::Row;
use std::time::Instant;

/// Answer used when the synthesis completion fails.
pub const APOLOGY: &str = "I encountered an error while processing your request.";

pub const NO_DATA: &str = "No data was retrieved. The query may have failed.";
pub const NO_DOCUMENTS_FOUND: &str = "No relevant documents found.";
pub const NEEDS_CLARIFICATION: &str = "This question requires clarification.";

const LINE_KEYWORDS: [&str; 4] = ["over time", "trend", "monthly", "yearly"];
const PIE_KEYWORDS: [&str; 2] = ["percentage", "proportion"];

/// Pick a chart for tabular results.
///
/// Needs at least one row with two or more columns. Temporal wording wins
/// over share wording; everything else is a bar chart.
pub fn choose_chart(query: &str, results: Option<&[Row]>) -> Option<ChartType> {
    let first = results?.first()?;
    if first.columns().count() < 2 {
        return None;
    }

    let query = query.to_lowercase();
    if LINE_KEYWORDS.iter().any(|k| query.contains(k)) {
        Some(ChartType::Line)
    } else if PIE_KEYWORDS.iter().any(|k| query.contains(k)) {
        Some(ChartType::Pie)
    } else {
        Some(ChartType::Bar)
    }
}

/// Context block for a data answer.
pub fn sql_context(
    sql: Option<&str>,
    results: Option<&[Row]>,
    sql_error: Option<&str>,
) -> AppResult<String> {
    match results {
        Some(rows) if !rows.is_empty() => Ok(format!(
            "SQL Query:\n{}\n\nQuery Results:\n{}\n",
            sql.unwrap_or_default(),
            serde_json::to_string_pretty(rows)?
        )),
        _ => Ok(match sql_error {
            Some(error) => format!("{}\nSQL error: {}", NO_DATA, error),
            None => NO_DATA.to_string(),
        }),
    }
}

/// Numbered passages, one block per chunk.
pub fn document_context(chunks: &[DocumentChunk]) -> String {
    if chunks.is_empty() {
        return NO_DOCUMENTS_FOUND.to_string();
    }
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[{}] (Page {}):\n{}", i + 1, chunk.page, chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub async fn synthesize(services: &AgentServices, state: &AgentState) -> StageOutcome {
    let start = Instant::now();
    let intent = state.intent();

    let (chart_type, citations) = match intent {
        Intent::Nl2sql => (choose_chart(&state.query, state.query_results.as_deref()), None),
        Intent::Rag => {
            let citations = state
                .rag_chunks
                .as_deref()
                .filter(|chunks| !chunks.is_empty())
                .map(|chunks| chunks.iter().map(Citation::from_chunk).collect::<Vec<_>>());
            (None, citations)
        }
        Intent::Clarify => (None, None),
    };

    let result = request_answer(services, state).await;
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(answer) => StageOutcome::ok(
            StateUpdate {
                answer: Some(answer),
                chart_type: Some(chart_type),
                citations: Some(citations),
                ..Default::default()
            }
            .with_metadata("synthesize_timing_ms", elapsed),
        ),
        Err(e) => {
            tracing::error!("Answer synthesis failed: {}", e);
            StageOutcome::degraded(
                StateUpdate {
                    answer: Some(APOLOGY.to_string()),
                    chart_type: Some(None),
                    citations: Some(None),
                    ..Default::default()
                }
                .with_metadata("synthesize_timing_ms", elapsed),
                format!("Answer synthesis failed: {}", e),
            )
        }
    }
}

async fn request_answer(services: &AgentServices, state: &AgentState) -> AppResult<String> {
    let intent = state.intent();
    let history = render_history(&state.conversation_history, services.settings.history_turns);

    let prompt = match intent {
        Intent::Rag => services.prompts.render(
            ANSWER_RAG,
            &vars([
                ("query", state.query.clone()),
                (
                    "context",
                    document_context(state.rag_chunks.as_deref().unwrap_or_default()),
                ),
                ("history", history),
            ]),
        )?,
        Intent::Nl2sql | Intent::Clarify => {
            let context = match intent {
                Intent::Nl2sql => sql_context(
                    state.sql.as_deref(),
                    state.query_results.as_deref(),
                    state.sql_error.as_deref(),
                )?,
                _ => NEEDS_CLARIFICATION.to_string(),
            };
            services.prompts.render(
                ANSWER_SYNTHESIZE,
                &vars([
                    ("query", state.query.clone()),
                    ("intent", intent.to_string()),
                    ("context", context),
                    ("history", history),
                ]),
            )?
        }
    };

    services.complete(prompt, DEFAULT_MAX_TOKENS, None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(columns: &[&str], count: usize) -> Vec<Row> {
        (0..count)
            .map(|i| {
                Row::new(
                    columns
                        .iter()
                        .map(|c| (c.to_string(), json!(i)))
                        .collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_chart_heuristic() {
        let two = rows(&["month", "total"], 3);
        assert_eq!(
            choose_chart("monthly spending trend", Some(two.as_slice())),
            Some(ChartType::Line)
        );
        assert_eq!(
            choose_chart("total by provider", Some(two.as_slice())),
            Some(ChartType::Bar)
        );
        assert_eq!(
            choose_chart("Percentage of claims denied", Some(two.as_slice())),
            Some(ChartType::Pie)
        );
        assert_eq!(
            choose_chart("percentage trend over time", Some(two.as_slice())),
            Some(ChartType::Line)
        );
    }

    #[test]
    fn test_no_chart_without_enough_data() {
        assert_eq!(choose_chart("total by provider", None), None);
        assert_eq!(choose_chart("total by provider", Some(&[][..])), None);
        assert_eq!(
            choose_chart("monthly trend", Some(rows(&["total"], 4).as_slice())),
            None
        );
    }

    #[test]
    fn test_sql_context_with_rows() {
        let results = vec![Row::new(vec![
            ("status".to_string(), json!("paid")),
            ("total".to_string(), json!(150.0)),
        ])];
        let context = sql_context(Some("SELECT 1"), Some(results.as_slice()), None).unwrap();
        assert!(context.starts_with("SQL Query:\nSELECT 1\n\nQuery Results:\n"));
        assert!(context.contains("\"status\": \"paid\""));
        assert!(context.find("status") < context.find("total"));
    }

    #[test]
    fn test_sql_context_without_rows() {
        assert_eq!(sql_context(None, None, None).unwrap(), NO_DATA);
        assert_eq!(
            sql_context(Some("SELECT x"), Some(&[][..]), Some("no such column: x")).unwrap(),
            format!("{}\nSQL error: no such column: x", NO_DATA)
        );
    }

    #[test]
    fn test_document_context_numbers_chunks() {
        let chunks = vec![
            DocumentChunk {
                text: "The deductible is $500.".to_string(),
                page: 1,
                doc_name: "plan".to_string(),
                score: 2.0,
            },
            DocumentChunk {
                text: "Copay is $40.".to_string(),
                page: 3,
                doc_name: "plan".to_string(),
                score: 1.0,
            },
        ];
        assert_eq!(
            document_context(&chunks),
            "[1] (Page 1):\nThe deductible is $500.\n\n[2] (Page 3):\nCopay is $40."
        );
        assert_eq!(document_context(&[]), NO_DOCUMENTS_FOUND);
    }
}
