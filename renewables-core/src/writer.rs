//! Table writers for the load stage.
//!
//! Writes are atomic: the table is encoded into `<path>.<ext>.tmp` and renamed
//! into place only once the encoder has finished. A failed write removes the
//! temp file, so a path either holds a complete table or nothing new.

use crate::error::LoadError;
use crate::naming::OutputFormat;
use crate::table::{NormalizedTable, Value};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// CSV rendering of timestamps.
pub const CSV_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Write `table` to `path` in `format`, creating the parent directory.
pub fn write_table(
    table: &NormalizedTable,
    path: &Path,
    format: OutputFormat,
) -> Result<(), LoadError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| LoadError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp_path = tmp_path_for(path, format);
    let encoded = match format {
        OutputFormat::Csv => write_csv(table, path, &tmp_path),
        OutputFormat::Parquet => write_parquet(table, path, &tmp_path),
    };
    if let Err(e) = encoded {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    // Atomic rename
    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        LoadError::Finalize {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// `wind_1_2.csv` → `wind_1_2.csv.tmp`
pub fn tmp_path_for(path: &Path, format: OutputFormat) -> PathBuf {
    path.with_extension(format!("{}.tmp", format.extension()))
}

// ── CSV ─────────────────────────────────────────────────────────────

fn write_csv(table: &NormalizedTable, path: &Path, tmp_path: &Path) -> Result<(), LoadError> {
    let encode = |e: csv::Error| LoadError::Encode {
        path: path.to_path_buf(),
        format: OutputFormat::Csv,
        reason: e.to_string(),
    };

    let file = fs::File::create(tmp_path).map_err(|source| LoadError::Io {
        path: tmp_path.to_path_buf(),
        source,
    })?;
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record(table.columns()).map_err(encode)?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(csv_cell)).map_err(encode)?;
    }

    wtr.flush().map_err(|source| LoadError::Io {
        path: tmp_path.to_path_buf(),
        source,
    })
}

/// Render one cell for CSV: floats with 5 decimals, UTC timestamps with an
/// explicit offset, nulls empty.
pub fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => format!("{v:.5}"),
        Value::Text(s) => s.clone(),
        Value::Timestamp(ts) => ts.format(CSV_TIMESTAMP_FORMAT).to_string(),
    }
}

// ── Parquet ─────────────────────────────────────────────────────────

/// Storage type of a column, inferred from its non-null values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Null,
    Bool,
    Int,
    Float,
    Text,
    Timestamp,
}

impl ColumnKind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Null => ColumnKind::Null,
            Value::Bool(_) => ColumnKind::Bool,
            Value::Int(_) => ColumnKind::Int,
            Value::Float(_) => ColumnKind::Float,
            Value::Text(_) => ColumnKind::Text,
            Value::Timestamp(_) => ColumnKind::Timestamp,
        }
    }

    /// Ints widen to floats; any other mix falls back to text.
    fn merge(self, other: ColumnKind) -> ColumnKind {
        use ColumnKind::*;
        match (self, other) {
            (Null, k) | (k, Null) => k,
            (a, b) if a == b => a,
            (Int, Float) | (Float, Int) => Float,
            _ => Text,
        }
    }
}

fn infer_kind(table: &NormalizedTable, col: usize) -> ColumnKind {
    table
        .rows()
        .iter()
        .map(|row| ColumnKind::of(&row[col]))
        .fold(ColumnKind::Null, ColumnKind::merge)
}

fn to_dataframe(table: &NormalizedTable, path: &Path) -> Result<DataFrame, LoadError> {
    let encode = |reason: String| LoadError::Encode {
        path: path.to_path_buf(),
        format: OutputFormat::Parquet,
        reason,
    };

    let mut columns = Vec::with_capacity(table.column_count());
    for (i, name) in table.columns().iter().enumerate() {
        let cells = table.rows().iter().map(|row| &row[i]);
        let column = match infer_kind(table, i) {
            ColumnKind::Bool => {
                let values: Vec<Option<bool>> = cells
                    .map(|v| match v {
                        Value::Bool(b) => Some(*b),
                        _ => None,
                    })
                    .collect();
                Column::new(name.as_str().into(), values)
            }
            ColumnKind::Int => {
                let values: Vec<Option<i64>> = cells
                    .map(|v| match v {
                        Value::Int(n) => Some(*n),
                        _ => None,
                    })
                    .collect();
                Column::new(name.as_str().into(), values)
            }
            ColumnKind::Float => {
                let values: Vec<Option<f64>> = cells.map(Value::as_f64).collect();
                Column::new(name.as_str().into(), values)
            }
            ColumnKind::Timestamp => {
                let millis: Vec<Option<i64>> = cells
                    .map(|v| match v {
                        Value::Timestamp(ts) => Some(ts.timestamp_millis()),
                        _ => None,
                    })
                    .collect();
                Column::new(name.as_str().into(), millis)
                    .cast(&utc_millis())
                    .map_err(|e| encode(format!("{name} cast: {e}")))?
            }
            ColumnKind::Text | ColumnKind::Null => {
                let values: Vec<Option<String>> = cells
                    .map(|v| (!v.is_null()).then(|| csv_cell(v)))
                    .collect();
                Column::new(name.as_str().into(), values)
            }
        };
        columns.push(column);
    }

    DataFrame::new(columns).map_err(|e| encode(format!("dataframe creation: {e}")))
}

/// Millisecond datetimes tagged `UTC`, so readers keep the zone.
fn utc_millis() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, Some("UTC".into()))
}

fn write_parquet(table: &NormalizedTable, path: &Path, tmp_path: &Path) -> Result<(), LoadError> {
    let mut df = to_dataframe(table, path)?;

    let file = fs::File::create(tmp_path).map_err(|source| LoadError::Io {
        path: tmp_path.to_path_buf(),
        source,
    })?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| LoadError::Encode {
            path: path.to_path_buf(),
            format: OutputFormat::Parquet,
            reason: format!("write parquet: {e}"),
        })?;
    Ok(())
}
