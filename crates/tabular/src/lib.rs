//! Tabular store for the claims agent.
//!
//! Loads CSV and Parquet files into an in-memory SQLite database, executes
//! generated SQL and renders schema and sample text for prompts.

pub mod columnar;
pub mod loader;
pub mod store;
pub mod value;

pub use columnar::read_parquet;
pub use loader::{read_csv, read_csv_str, sanitize_table_name, ColumnType, TableData};
pub use store::{TableFormat, TableInfo, TabularStore, NO_SAMPLE_DATA, NO_TABLES};
pub use value::Row;
