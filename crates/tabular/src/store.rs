//! In-memory SQL store for loaded claims tables.
//!
//! One SQLite connection sits behind a mutex, so loads and queries are
//! serialized. A reload drops and recreates the table inside a single
//! transaction; readers see either the old table or the new one.

use crate::columnar::read_parquet;
use crate::loader::{read_csv, sanitize_table_name, ColumnType, TableData};
use crate::value::{display_value, json_value, Row};
use claims_core::{AppError, AppResult};
use parking_lot::Mutex;
use rusqlite::{params_from_iter, Batch, Connection};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const NO_TABLES: &str = "No tables loaded.";
pub const NO_SAMPLE_DATA: &str = "No sample data available.";

/// A loaded table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub name: String,
    pub row_count: usize,
    pub columns: Vec<(String, ColumnType)>,
}

/// On-disk formats a table can be loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

struct Inner {
    conn: Connection,
    tables: BTreeMap<String, TableInfo>,
}

/// Analytical store over CSV-loaded tables.
pub struct TabularStore {
    inner: Mutex<Inner>,
}

impl TabularStore {
    /// Open an empty in-memory store.
    pub fn new() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Tabular(format!("Failed to open SQL engine: {}", e)))?;
        Ok(Self {
            inner: Mutex::new(Inner {
                conn,
                tables: BTreeMap::new(),
            }),
        })
    }

    /// Load a CSV file as `table_name`, replacing any table of that name.
    ///
    /// Returns the number of rows loaded.
    pub fn load_csv(&self, path: &Path, table_name: &str) -> AppResult<usize> {
        if !path.exists() {
            return Err(AppError::Tabular(format!("CSV not found: {:?}", path)));
        }
        let table = read_csv(path)?;
        let count = self.load_table(table_name, table)?;
        tracing::info!("Loaded {} rows from {:?} into {}", count, path, table_name);
        Ok(count)
    }

    /// Load a Parquet file as `table_name`, replacing any table of that name.
    pub fn load_parquet(&self, path: &Path, table_name: &str) -> AppResult<usize> {
        if !path.exists() {
            return Err(AppError::Tabular(format!("Parquet not found: {:?}", path)));
        }
        let table = read_parquet(path)?;
        let count = self.load_table(table_name, table)?;
        tracing::info!("Loaded {} rows from {:?} into {}", count, path, table_name);
        Ok(count)
    }

    /// Load a `.csv` or `.parquet` file, chosen by extension.
    pub fn load_file(&self, path: &Path, table_name: &str) -> AppResult<usize> {
        match TableFormat::from_path(path) {
            Some(TableFormat::Csv) => self.load_csv(path, table_name),
            Some(TableFormat::Parquet) => self.load_parquet(path, table_name),
            None => Err(AppError::Tabular(format!(
                "Unsupported table file {:?}; expected .csv or .parquet",
                path
            ))),
        }
    }

    /// Load every `*.csv` and `*.parquet` file directly inside `dir`, named
    /// by file stem.
    ///
    /// Files that fail to load are skipped with a warning.
    pub fn load_dir(&self, dir: &Path) -> AppResult<Vec<(String, usize)>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && TableFormat::from_path(p).is_some())
            .collect();
        paths.sort();

        let mut loaded = Vec::new();
        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let name = sanitize_table_name(stem);
            match self.load_file(&path, &name) {
                Ok(count) => loaded.push((name, count)),
                Err(e) => tracing::warn!("Skipping {:?}: {}", path, e),
            }
        }
        Ok(loaded)
    }

    /// Create (or replace) a table from parsed rows.
    pub fn load_table(&self, table_name: &str, table: TableData) -> AppResult<usize> {
        let name = sanitize_table_name(table_name);
        if name.is_empty() {
            return Err(AppError::Tabular("Table name cannot be empty".to_string()));
        }
        if table.columns.is_empty() {
            return Err(AppError::Tabular(format!("Table {} has no columns", name)));
        }

        let column_defs: Vec<String> = table
            .columns
            .iter()
            .map(|(col, ty)| format!("{} {}", quote_ident(col), ty))
            .collect();
        let placeholders = vec!["?"; table.columns.len()].join(", ");

        let mut guard = self.inner.lock();
        let Inner { conn, tables } = &mut *guard;

        let tx = conn
            .transaction()
            .map_err(|e| AppError::Tabular(format!("Failed to begin load of {}: {}", name, e)))?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {ident}; CREATE TABLE {ident} ({cols});",
            ident = quote_ident(&name),
            cols = column_defs.join(", ")
        ))
        .map_err(|e| AppError::Tabular(format!("Failed to create table {}: {}", name, e)))?;
        {
            let mut insert = tx
                .prepare(&format!(
                    "INSERT INTO {} VALUES ({})",
                    quote_ident(&name),
                    placeholders
                ))
                .map_err(|e| AppError::Tabular(format!("Failed to prepare insert: {}", e)))?;
            for row in &table.rows {
                insert
                    .execute(params_from_iter(row.iter()))
                    .map_err(|e| AppError::Tabular(format!("Failed to insert row: {}", e)))?;
            }
        }
        tx.commit()
            .map_err(|e| AppError::Tabular(format!("Failed to commit load of {}: {}", name, e)))?;

        let row_count = table.rows.len();
        tables.insert(
            name.clone(),
            TableInfo {
                name,
                row_count,
                columns: table.columns,
            },
        );
        Ok(row_count)
    }

    /// Run one read-only statement and collect its rows.
    ///
    /// Anything after the first statement other than whitespace, `;` or
    /// comments is rejected.
    pub fn execute(&self, sql: &str) -> AppResult<Vec<Row>> {
        let guard = self.inner.lock();
        let mut batch = Batch::new(&guard.conn, sql);
        let mut stmt = batch.next().map_err(execution_error)?.ok_or_else(|| {
            AppError::Tabular("SQL execution error: no statement to run".to_string())
        })?;
        if batch.next().map_err(execution_error)?.is_some() {
            return Err(AppError::Tabular(
                "SQL execution error: only a single statement is allowed".to_string(),
            ));
        }
        if !stmt.readonly() {
            return Err(AppError::Tabular(
                "SQL execution error: only read-only statements are allowed".to_string(),
            ));
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let mut rows = stmt.query([]).map_err(execution_error)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().map_err(execution_error)? {
            let mut cells = Vec::with_capacity(columns.len());
            for (i, column) in columns.iter().enumerate() {
                let value = row.get_ref(i).map_err(execution_error)?;
                cells.push((column.clone(), json_value(value)));
            }
            results.push(Row::new(cells));
        }

        tracing::debug!("Query returned {} rows", results.len());
        Ok(results)
    }

    /// `CREATE TABLE` text for every loaded table.
    pub fn describe_schema(&self) -> String {
        let guard = self.inner.lock();
        let mut schemas = Vec::new();
        for name in guard.tables.keys() {
            match describe_table(&guard.conn, name) {
                Ok(schema) => schemas.push(schema),
                Err(e) => tracing::warn!("Could not describe {}: {}", name, e),
            }
        }
        if schemas.is_empty() {
            NO_TABLES.to_string()
        } else {
            schemas.join("\n\n")
        }
    }

    /// First `limit` rows of a table as pipe-separated text.
    pub fn sample_rows(&self, table_name: &str, limit: usize) -> String {
        let guard = self.inner.lock();
        sample_table(&guard.conn, table_name, limit).unwrap_or_else(|e| {
            tracing::debug!("No sample for {}: {}", table_name, e);
            NO_SAMPLE_DATA.to_string()
        })
    }

    /// Samples of every loaded table, each headed by its name.
    pub fn sample_all(&self, limit: usize) -> String {
        let names: Vec<String> = self.inner.lock().tables.keys().cloned().collect();
        if names.is_empty() {
            return NO_SAMPLE_DATA.to_string();
        }
        names
            .iter()
            .map(|name| format!("Table {}:\n{}", name, self.sample_rows(name, limit)))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn tables(&self) -> Vec<TableInfo> {
        self.inner.lock().tables.values().cloned().collect()
    }

    pub fn is_ready(&self) -> bool {
        !self.inner.lock().tables.is_empty()
    }
}

fn execution_error(e: rusqlite::Error) -> AppError {
    AppError::Tabular(format!("SQL execution error: {}", e))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn describe_table(conn: &Connection, name: &str) -> rusqlite::Result<String> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(name)))?;
    let cols = stmt
        .query_map([], |row| {
            let col: String = row.get(1)?;
            let ty: String = row.get(2)?;
            Ok(format!("  {} {}", quote_ident(&col), ty))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(format!("CREATE TABLE {} (\n{}\n);", name, cols.join(",\n")))
}

fn sample_table(conn: &Connection, name: &str, limit: usize) -> rusqlite::Result<String> {
    let mut stmt = conn.prepare(&format!(
        "SELECT * FROM {} LIMIT {}",
        quote_ident(name),
        limit
    ))?;
    let header = stmt.column_names().join(" | ");
    let width = stmt.column_count();

    let mut lines = vec![header.clone(), "-".repeat(header.chars().count())];
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let cells = (0..width)
            .map(|i| row.get_ref(i).map(display_value))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        lines.push(cells.join(" | "));
    }
    Ok(lines.join("\n"))
}
