//! SQL generation, execution and repair.
//!
//! The orchestrator drives these three stages as a loop: generate once,
//! execute, and repair while executions fail and the retry ceiling allows.

use crate::output::extract_sql;
use crate::services::AgentServices;
use crate::state::{AgentState, StageOutcome, StateUpdate};
use claims_core::{AppError, AppResult};
use claims_prompt::{vars, SQL_GENERATE, SQL_REPAIR};
use std::time::Instant;

const SQL_MAX_TOKENS: u32 = 1024;

/// Error recorded when the execute stage is reached without a statement.
pub const NO_SQL_TO_EXECUTE: &str = "No SQL query to execute";

pub async fn generate_sql(services: &AgentServices, state: &AgentState) -> StageOutcome {
    let start = Instant::now();
    let result = request_generation(services, &state.query).await;
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(sql) => {
            tracing::info!("Generated SQL: {}", sql);
            StageOutcome::ok(
                StateUpdate {
                    sql: Some(Some(sql)),
                    sql_error: Some(None),
                    ..Default::default()
                }
                .with_metadata("sql_generation_timing_ms", elapsed),
            )
        }
        Err(reason) => {
            let message = format!("SQL generation failed: {}", reason);
            tracing::warn!("{}", message);
            StageOutcome::degraded(
                StateUpdate {
                    sql: Some(None),
                    sql_error: Some(Some(message.clone())),
                    ..Default::default()
                }
                .with_metadata("sql_generation_timing_ms", elapsed),
                message,
            )
        }
    }
}

async fn request_generation(services: &AgentServices, query: &str) -> Result<String, String> {
    let prompt = services
        .prompts
        .render(
            SQL_GENERATE,
            &vars([
                ("query", query.to_string()),
                ("schema", services.tabular.describe_schema()),
                (
                    "sample_data",
                    services.tabular.sample_all(services.settings.sample_rows),
                ),
            ]),
        )
        .map_err(|e| e.to_string())?;

    let text = services
        .complete(prompt, SQL_MAX_TOKENS, Some(0.0))
        .await
        .map_err(|e| e.to_string())?;

    extract_sql(&text).ok_or_else(|| "completion contained no SQL".to_string())
}

/// Run the current statement.
///
/// A failure records the store's message in `sql_error` and counts one more
/// failed execution. A missing statement is reported without counting.
pub async fn execute_query(services: &AgentServices, state: &AgentState) -> StageOutcome {
    let start = Instant::now();

    let Some(sql) = state.sql.as_deref() else {
        let update = StateUpdate {
            sql_error: Some(Some(NO_SQL_TO_EXECUTE.to_string())),
            query_results: Some(None),
            ..Default::default()
        }
        .with_metadata("execute_timing_ms", start.elapsed().as_secs_f64() * 1000.0);
        return StageOutcome::degraded(update, NO_SQL_TO_EXECUTE);
    };

    let result = services.tabular.execute(sql);
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(rows) => {
            tracing::info!("Query returned {} rows", rows.len());
            StageOutcome::ok(
                StateUpdate {
                    sql_error: Some(None),
                    query_results: Some(Some(rows)),
                    ..Default::default()
                }
                .with_metadata("execute_timing_ms", elapsed),
            )
        }
        Err(e) => {
            let message = match e {
                AppError::Tabular(message) => message,
                other => other.to_string(),
            };
            let attempts = state.sql_retry_count + 1;
            tracing::warn!("Execution attempt {} failed: {}", attempts, message);
            StageOutcome::degraded(
                StateUpdate {
                    sql_error: Some(Some(message.clone())),
                    sql_retry_count: Some(attempts),
                    query_results: Some(None),
                    ..Default::default()
                }
                .with_metadata("execute_timing_ms", elapsed),
                message,
            )
        }
    }
}

/// Ask for a corrected statement. On failure the previous statement stays.
pub async fn fix_sql(services: &AgentServices, state: &AgentState) -> StageOutcome {
    let start = Instant::now();
    let result = request_repair(services, state).await;
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(Some(sql)) => {
            tracing::info!("Repaired SQL: {}", sql);
            StageOutcome::ok(
                StateUpdate {
                    sql: Some(Some(sql)),
                    ..Default::default()
                }
                .with_metadata("sql_fix_timing_ms", elapsed),
            )
        }
        Ok(None) => StageOutcome::degraded(
            StateUpdate::default().with_metadata("sql_fix_timing_ms", elapsed),
            "SQL repair returned no statement",
        ),
        Err(e) => {
            tracing::warn!("SQL repair failed: {}", e);
            StageOutcome::degraded(
                StateUpdate::default().with_metadata("sql_fix_timing_ms", elapsed),
                format!("SQL repair failed: {}", e),
            )
        }
    }
}

async fn request_repair(services: &AgentServices, state: &AgentState) -> AppResult<Option<String>> {
    let prompt = services.prompts.render(
        SQL_REPAIR,
        &vars([
            ("sql", state.sql.clone().unwrap_or_default()),
            ("error", state.sql_error.clone().unwrap_or_default()),
            ("schema", services.tabular.describe_schema()),
        ]),
    )?;

    let text = services.complete(prompt, SQL_MAX_TOKENS, Some(0.0)).await?;
    Ok(extract_sql(&text))
}
