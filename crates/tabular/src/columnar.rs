//! Parquet reading through the Arrow record-batch reader.
//!
//! Integer and boolean columns load as INTEGER, float and decimal columns as
//! REAL. Everything else (strings, dates, timestamps) is rendered to TEXT.

use crate::loader::{unique_column_names, ColumnType, TableData};
use arrow_array::cast::AsArray;
use arrow_array::types::{Float64Type, Int64Type};
use arrow_array::{Array, ArrayRef};
use arrow_cast::cast;
use arrow_cast::display::{ArrayFormatter, FormatOptions};
use arrow_schema::{ArrowError, DataType};
use claims_core::{AppError, AppResult};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rusqlite::types::Value as SqlValue;
use std::fs::File;
use std::path::Path;

/// Read every row group of a Parquet file.
pub fn read_parquet(path: &Path) -> AppResult<TableData> {
    let file = File::open(path)
        .map_err(|e| AppError::Tabular(format!("Failed to open Parquet {:?}: {}", path, e)))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| AppError::Tabular(format!("Failed to read Parquet {:?}: {}", path, e)))?;

    let fields = builder.schema().fields().clone();
    let names = unique_column_names(fields.iter().map(|f| f.name().as_str()));
    let types: Vec<ColumnType> = fields.iter().map(|f| column_type(f.data_type())).collect();

    let reader = builder
        .build()
        .map_err(|e| AppError::Tabular(format!("Failed to read Parquet {:?}: {}", path, e)))?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch
            .map_err(|e| AppError::Tabular(format!("Failed to decode Parquet {:?}: {}", path, e)))?;
        let mut columns = Vec::with_capacity(types.len());
        for (array, ty) in batch.columns().iter().zip(&types) {
            let values = column_values(array, *ty).map_err(|e| {
                AppError::Tabular(format!("Failed to convert Parquet {:?}: {}", path, e))
            })?;
            columns.push(values.into_iter());
        }
        for _ in 0..batch.num_rows() {
            rows.push(
                columns
                    .iter_mut()
                    .map(|column| column.next().unwrap_or(SqlValue::Null))
                    .collect(),
            );
        }
    }

    Ok(TableData {
        columns: names.into_iter().zip(types).collect(),
        rows,
    })
}

fn column_type(data_type: &DataType) -> ColumnType {
    match data_type {
        DataType::Boolean
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => ColumnType::Integer,
        DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _) => ColumnType::Real,
        _ => ColumnType::Text,
    }
}

fn column_values(array: &ArrayRef, ty: ColumnType) -> Result<Vec<SqlValue>, ArrowError> {
    let len = array.len();
    match ty {
        // Values that do not fit an i64 become NULL
        ColumnType::Integer => {
            let ints = cast(array.as_ref(), &DataType::Int64)?;
            let ints = ints.as_primitive::<Int64Type>();
            Ok((0..len)
                .map(|i| {
                    if ints.is_null(i) {
                        SqlValue::Null
                    } else {
                        SqlValue::Integer(ints.value(i))
                    }
                })
                .collect())
        }
        ColumnType::Real => {
            let floats = cast(array.as_ref(), &DataType::Float64)?;
            let floats = floats.as_primitive::<Float64Type>();
            Ok((0..len)
                .map(|i| {
                    if floats.is_null(i) {
                        SqlValue::Null
                    } else {
                        SqlValue::Real(floats.value(i))
                    }
                })
                .collect())
        }
        ColumnType::Text => {
            let options = FormatOptions::default();
            let formatter = ArrayFormatter::try_new(array.as_ref(), &options)?;
            Ok((0..len)
                .map(|i| {
                    if array.is_null(i) {
                        SqlValue::Null
                    } else {
                        SqlValue::Text(formatter.value(i).to_string())
                    }
                })
                .collect())
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use arrow_array::{BooleanArray, Float64Array, Int32Array, RecordBatch, StringArray};
    use arrow_schema::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;
    use tempfile::TempDir;

    pub(crate) fn write_claims_parquet(path: &Path) {
        let schema = Arc::new(Schema::new(vec![
            Field::new("status", DataType::Utf8, true),
            Field::new("amount", DataType::Float64, true),
            Field::new("lines", DataType::Int32, false),
            Field::new("appealed", DataType::Boolean, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("PAID"), Some("DENIED"), None])),
                Arc::new(Float64Array::from(vec![Some(120.5), None, Some(40.0)])),
                Arc::new(Int32Array::from(vec![1, 2, 3])),
                Arc::new(BooleanArray::from(vec![Some(false), Some(true), None])),
            ],
        )
        .unwrap();

        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn test_read_parquet_maps_types_and_nulls() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("claims.parquet");
        write_claims_parquet(&path);

        let table = read_parquet(&path).unwrap();
        assert_eq!(
            table.columns,
            vec![
                ("status".to_string(), ColumnType::Text),
                ("amount".to_string(), ColumnType::Real),
                ("lines".to_string(), ColumnType::Integer),
                ("appealed".to_string(), ColumnType::Integer),
            ]
        );
        assert_eq!(table.rows.len(), 3);
        assert_eq!(
            table.rows[0],
            vec![
                SqlValue::Text("PAID".to_string()),
                SqlValue::Real(120.5),
                SqlValue::Integer(1),
                SqlValue::Integer(0),
            ]
        );
        assert_eq!(table.rows[1][1], SqlValue::Null);
        assert_eq!(table.rows[2][0], SqlValue::Null);
        assert_eq!(table.rows[2][3], SqlValue::Null);
    }

    #[test]
    fn test_missing_or_invalid_parquet_is_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(read_parquet(&temp_dir.path().join("absent.parquet")).is_err());

        let bogus = temp_dir.path().join("bogus.parquet");
        std::fs::write(&bogus, "status,amount\n").unwrap();
        assert!(matches!(read_parquet(&bogus), Err(AppError::Tabular(_))));
    }
}
