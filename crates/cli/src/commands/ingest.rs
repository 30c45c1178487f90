//! Ingest command handler.
//!
//! Parses plan documents and adds them to the configured retrieval engine.

use claims_core::{config::AppConfig, AppError, AppResult};
use claims_retrieval::{collect_documents, create_engine};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

/// Ingest plan documents for search
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Files or directories to ingest (PDF, text, markdown)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Document name (single file only; default: file stem)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for {} paths", self.paths.len());
        let start = Instant::now();

        let mut files = Vec::new();
        for path in &self.paths {
            files.extend(collect_documents(path)?);
        }
        if files.is_empty() {
            return Err(AppError::Retrieval("No supported documents found".to_string()));
        }
        if self.name.is_some() && files.len() != 1 {
            return Err(AppError::Config(format!(
                "--name needs exactly one document, found {}",
                files.len()
            )));
        }

        let engine = create_engine(&config.retrieval, &config.data_dir())?;

        let mut ingested = Vec::new();
        let mut failed = 0usize;
        for file in &files {
            match engine.ingest_path(file, self.name.as_deref()).await {
                Ok(chunks) => {
                    if !self.json {
                        println!("Ingested {:?} ({} chunks)", file, chunks);
                    }
                    ingested.push(serde_json::json!({
                        "path": file,
                        "chunks": chunks,
                    }));
                }
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", file, e);
                    failed += 1;
                }
            }
        }

        let duration_secs = start.elapsed().as_secs_f64();
        if self.json {
            let output = serde_json::json!({
                "engine": engine.engine_name(),
                "documents": ingested,
                "failed": failed,
                "documentCount": engine.document_count(),
                "chunkCount": engine.chunk_count(),
                "durationSecs": duration_secs,
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!(
                "Index holds {} documents ({} chunks); {} failed, {:.2}s",
                engine.document_count(),
                engine.chunk_count(),
                failed,
                duration_secs
            );
        }

        if ingested.is_empty() {
            return Err(AppError::Retrieval("No document could be ingested".to_string()));
        }
        Ok(())
    }
}
