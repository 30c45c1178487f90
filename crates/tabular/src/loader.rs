//! CSV reading and column type inference.
//!
//! Parquet files go through [`crate::columnar`] and produce the same
//! [`TableData`].

use claims_core::{AppError, AppResult};
use rusqlite::types::Value as SqlValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Declared SQLite type for a loaded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows ready for insertion, with one declared type per column.
#[derive(Debug, Clone)]
pub struct TableData {
    pub columns: Vec<(String, ColumnType)>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
pub fn sanitize_table_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Read a CSV file with a header row.
pub fn read_csv(path: &Path) -> AppResult<TableData> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|e| AppError::Tabular(format!("Failed to open CSV {:?}: {}", path, e)))?;
    parse_csv(reader)
        .map_err(|e| AppError::Tabular(format!("Failed to read CSV {:?}: {}", path, e)))
}

/// Read CSV text with a header row.
pub fn read_csv_str(contents: &str) -> AppResult<TableData> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(contents.as_bytes());
    parse_csv(reader).map_err(|e| AppError::Tabular(format!("Failed to read CSV: {}", e)))
}

fn parse_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<TableData, csv::Error> {
    let headers = unique_column_names(reader.headers()?.iter());

    let mut raw: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        raw.push(record.iter().map(str::to_string).collect());
    }

    let types: Vec<ColumnType> = (0..headers.len())
        .map(|i| infer_type(raw.iter().map(|row| row[i].as_str())))
        .collect();

    let rows = raw
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&types)
                .map(|(cell, ty)| convert_cell(&cell, *ty))
                .collect()
        })
        .collect();

    Ok(TableData {
        columns: headers.into_iter().zip(types).collect(),
        rows,
    })
}

/// Header names with blanks filled and duplicates suffixed.
pub(crate) fn unique_column_names<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    headers
        .enumerate()
        .map(|(i, header)| {
            let base = if header.is_empty() {
                format!("column{}", i)
            } else {
                header.to_string()
            };
            let mut name = base.clone();
            let mut n = 1;
            while !seen.insert(name.clone()) {
                name = format!("{}_{}", base, n);
                n += 1;
            }
            name
        })
        .collect()
}

fn infer_type<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut ty: Option<ColumnType> = None;
    for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
        let cell_ty = if parse_integer(cell).is_some() {
            ColumnType::Integer
        } else if parse_real(cell).is_some() {
            ColumnType::Real
        } else {
            return ColumnType::Text;
        };
        ty = match (ty, cell_ty) {
            (Some(ColumnType::Real), _) | (_, ColumnType::Real) => Some(ColumnType::Real),
            _ => Some(ColumnType::Integer),
        };
    }
    ty.unwrap_or(ColumnType::Text)
}

fn convert_cell(cell: &str, ty: ColumnType) -> SqlValue {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return SqlValue::Null;
    }
    match ty {
        ColumnType::Integer => parse_integer(trimmed)
            .map(SqlValue::Integer)
            .unwrap_or(SqlValue::Null),
        ColumnType::Real => parse_real(trimmed)
            .map(SqlValue::Real)
            .unwrap_or(SqlValue::Null),
        ColumnType::Text => SqlValue::Text(cell.to_string()),
    }
}

// Identifiers such as "00123" stay text.
fn has_leading_zero(cell: &str) -> bool {
    let digits = cell.trim_start_matches(['-', '+']);
    digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.")
}

fn parse_integer(cell: &str) -> Option<i64> {
    if has_leading_zero(cell) {
        return None;
    }
    cell.parse::<i64>().ok()
}

fn parse_real(cell: &str) -> Option<f64> {
    if has_leading_zero(cell) || !cell.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    cell.parse::<f64>().ok().filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_table_name() {
        assert_eq!(sanitize_table_name("claims-2025 Q1"), "claims_2025_Q1");
        assert_eq!(sanitize_table_name("plain_name"), "plain_name");
        assert_eq!(sanitize_table_name("für"), "f_r");
    }

    #[test]
    fn test_type_inference() {
        let table = read_csv_str(
            "id,amount,status,zip,Total Charges\n1,10.5,PAID,02134,\"$1,200.00\"\n2,7,DENIED,10001,$80.00\n3,,PAID,,\n",
        )
        .unwrap();

        let types: Vec<_> = table.columns.iter().map(|(n, t)| (n.as_str(), *t)).collect();
        assert_eq!(
            types,
            vec![
                ("id", ColumnType::Integer),
                ("amount", ColumnType::Real),
                ("status", ColumnType::Text),
                ("zip", ColumnType::Text),
                ("Total Charges", ColumnType::Text),
            ]
        );
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1][1], SqlValue::Real(7.0));
        assert_eq!(table.rows[2][1], SqlValue::Null);
        assert_eq!(table.rows[0][4], SqlValue::Text("$1,200.00".to_string()));
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let table = read_csv_str("a,a,,b\n1,2,3,4\n").unwrap();
        let names: Vec<_> = table.columns.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "a_1", "column2", "b"]);
    }

    #[test]
    fn test_all_empty_column_is_text() {
        let table = read_csv_str("a,b\n1,\n2,\n").unwrap();
        assert_eq!(table.columns[1].1, ColumnType::Text);
        assert_eq!(table.rows[0][1], SqlValue::Null);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        assert!(read_csv_str("a,b\n1,2,3\n").is_err());
    }
}
