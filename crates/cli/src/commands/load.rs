//! Load command handler.
//!
//! Validates a CSV or Parquet file as a table and copies it into the data
//! directory, where it is loaded again at every startup.

use claims_core::{config::AppConfig, AppError, AppResult};
use claims_tabular::{sanitize_table_name, TableFormat, TabularStore};
use clap::Args;
use std::path::{Path, PathBuf};

/// Load a CSV or Parquet file as a queryable table
#[derive(Args, Debug)]
pub struct LoadCommand {
    /// CSV or Parquet file to load
    pub file: PathBuf,

    /// Table name (default: sanitized file stem)
    #[arg(short, long)]
    pub table: Option<String>,
}

impl LoadCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing load command for {:?}", self.file);

        let format = TableFormat::from_path(&self.file).ok_or_else(|| {
            AppError::Config(format!("Expected a .csv or .parquet file: {:?}", self.file))
        })?;
        let name = table_name(&self.file, self.table.as_deref())?;

        let store = TabularStore::new()?;
        let rows = store.load_file(&self.file, &name)?;

        let data_dir = config.data_dir();
        let target = data_dir.join(format!("{}.{}", name, format.extension()));
        if !same_file(&self.file, &target) {
            std::fs::copy(&self.file, &target)?;
            tracing::debug!("Copied {:?} to {:?}", self.file, target);
        }
        // A same-named table in the other format would load over this one
        for other in [TableFormat::Csv, TableFormat::Parquet] {
            let stale = data_dir.join(format!("{}.{}", name, other.extension()));
            if other != format && stale.exists() {
                std::fs::remove_file(&stale)?;
                tracing::debug!("Removed {:?}", stale);
            }
        }

        let columns = store
            .tables()
            .into_iter()
            .find(|t| t.name == name)
            .map(|t| t.columns.len())
            .unwrap_or_default();
        println!("Loaded {} rows ({} columns) into table {}", rows, columns, name);

        Ok(())
    }
}

fn table_name(path: &Path, explicit: Option<&str>) -> AppResult<String> {
    let raw = match explicit {
        Some(name) => name.to_string(),
        None => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::Config(format!("Cannot derive a table name from {:?}", path)))?,
    };

    let name = sanitize_table_name(&raw);
    if name.is_empty() {
        return Err(AppError::Config(format!("Invalid table name: {}", raw)));
    }
    Ok(name)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
