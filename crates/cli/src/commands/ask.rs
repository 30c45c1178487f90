//! Ask command handler.
//!
//! Runs one query through the orchestrator and prints the answer.

use claims_agent::{AgentEvent, AgentResponse, AgentServices, Orchestrator, TraceStatus};
use claims_core::{config::AppConfig, AppError, AppResult};
use clap::Args;
use futures::StreamExt;
use std::io::Write;

/// Ask a question about claims data or plan documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Print the full response as JSON
    #[arg(long)]
    pub json: bool,

    /// Stream progress and the answer as they are produced
    #[arg(long)]
    pub stream: bool,

    /// Do not print the node trace
    #[arg(long)]
    pub no_trace: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        config.validate()?;
        let services = AgentServices::from_config(config)?;
        if !services.tabular.is_ready() && !services.retrieval.is_ready() {
            tracing::warn!("No tables or documents loaded; run `claims load` or `claims ingest` first");
        }
        let orchestrator = Orchestrator::new(services);

        if self.stream {
            self.handle_streaming(&orchestrator).await
        } else {
            let response = orchestrator.run(self.query.as_str(), Vec::new()).await;
            if !self.no_trace {
                print_trace(&response);
            }
            self.print_response(&response)
        }
    }

    async fn handle_streaming(&self, orchestrator: &Orchestrator) -> AppResult<()> {
        tracing::info!("Streaming query events");

        let mut events = Box::pin(orchestrator.stream(self.query.as_str(), Vec::new()));
        let mut streamed_answer = false;

        while let Some(event) = events.next().await {
            match event {
                AgentEvent::Trace {
                    node,
                    status,
                    timing_ms,
                    message,
                } => {
                    if self.no_trace {
                        continue;
                    }
                    match (status, timing_ms, message) {
                        (TraceStatus::Error, _, Some(message)) => {
                            eprintln!("[{}] error: {}", node, message)
                        }
                        (TraceStatus::Complete, Some(ms), _) => {
                            eprintln!("[{}] complete ({:.0}ms)", node, ms)
                        }
                        _ => eprintln!("[{}] running", node),
                    }
                }
                AgentEvent::AnswerChunk { text } => {
                    if !self.json {
                        print!("{}", text);
                        std::io::stdout().flush().ok();
                        streamed_answer = true;
                    }
                }
                AgentEvent::Complete { response } => {
                    if self.json {
                        self.print_response(&response)?;
                    } else {
                        if streamed_answer {
                            println!();
                        }
                        print_details(&response);
                    }
                }
            }
        }

        Ok(())
    }

    fn print_response(&self, response: &AgentResponse) -> AppResult<()> {
        if self.json {
            let json = serde_json::to_string_pretty(response)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", response.answer);
            print_details(response);
        }
        Ok(())
    }
}

/// SQL and sources shown under a plain-text answer.
fn print_details(response: &AgentResponse) {
    if let Some(sql) = &response.sql {
        println!("\nSQL: {}", sql);
    }
    if let Some(error) = &response.sql_error {
        println!("SQL error: {}", error);
    }
    if let Some(rows) = &response.query_results {
        println!("Rows: {}", rows.len());
    }
    if let Some(citations) = &response.citations {
        println!("\nSources:");
        for citation in citations {
            println!("- {} (page {})", citation.doc_name, citation.page);
        }
    }
}

fn print_trace(response: &AgentResponse) {
    for entry in &response.agent_trace {
        match &entry.message {
            Some(message) => eprintln!("[{}] error: {}", entry.node, message),
            None => eprintln!("[{}] complete ({:.0}ms)", entry.node, entry.timing_ms),
        }
    }
    eprintln!("Total: {}ms", response.timing_ms);
}
