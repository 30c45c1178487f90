//! Status command handler.
//!
//! Summarizes what a query can draw on: tables, documents, engine, provider.

use claims_core::{config::AppConfig, AppError, AppResult};
use claims_retrieval::create_engine;
use claims_tabular::TabularStore;
use clap::Args;

/// Show loaded tables, documents and provider
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing status command");

        let data_dir = config.data_dir();
        let store = TabularStore::new()?;
        store.load_dir(&data_dir)?;
        let tables = store.tables();

        let engine = create_engine(&config.retrieval, &data_dir)?;
        let documents = engine.list_documents();

        if self.json {
            let output = serde_json::json!({
                "provider": config.provider,
                "model": config.model,
                "dataDir": data_dir,
                "tables": tables
                    .iter()
                    .map(|t| serde_json::json!({
                        "name": t.name,
                        "rows": t.row_count,
                        "columns": t.columns.iter().map(|(c, _)| c.as_str()).collect::<Vec<_>>(),
                    }))
                    .collect::<Vec<_>>(),
                "engine": engine.engine_name(),
                "documents": documents,
                "chunkCount": engine.chunk_count(),
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        println!("Provider: {} ({})", config.provider, config.model);
        println!("Data dir: {}", data_dir.display());

        if tables.is_empty() {
            println!("Tables: none");
        } else {
            println!("Tables:");
            for table in &tables {
                println!(
                    "  {} ({} rows, {} columns)",
                    table.name,
                    table.row_count,
                    table.columns.len()
                );
            }
        }

        if documents.is_empty() {
            println!("Documents: none ({} engine)", engine.engine_name());
        } else {
            println!(
                "Documents ({} engine, {} chunks):",
                engine.engine_name(),
                engine.chunk_count()
            );
            for name in &documents {
                println!("  {}", name);
            }
        }

        Ok(())
    }
}
