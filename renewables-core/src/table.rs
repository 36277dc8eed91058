//! Normalized table shared by every source.
//!
//! A table is an ordered list of column names plus rows of scalar values.
//! Every row carries exactly one value per column; tables built from
//! heterogeneous records (or concatenated from several tables) take the union
//! of their columns in first-seen order and fill gaps with `Value::Null`.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("row {row} has {actual} values but the table has {expected} columns")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
}

/// Rows of scalar values under a fixed, ordered column set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl NormalizedTable {
    /// Empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Result<Self, TableError> {
        let mut seen = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if seen.insert(name.as_str(), i).is_some() {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Empty table over columns already known to be distinct.
    pub(crate) fn from_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from keyed records, unioning their keys.
    ///
    /// Columns appear in the order they are first seen. A key repeated inside
    /// one record keeps its last value.
    pub fn from_records(records: Vec<Vec<(String, Value)>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for record in &records {
            for (name, _) in record {
                if !index.contains_key(name) {
                    index.insert(name.clone(), columns.len());
                    columns.push(name.clone());
                }
            }
        }

        let width = columns.len();
        let rows = records
            .into_iter()
            .map(|record| {
                let mut row = vec![Value::Null; width];
                for (name, value) in record {
                    row[index[&name]] = value;
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Concatenate tables row-wise over the union of their columns.
    ///
    /// Rows keep their input order; no deduplication is performed. Columns a
    /// table lacks are filled with `Value::Null`.
    pub fn concat<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = NormalizedTable>,
    {
        let tables: Vec<NormalizedTable> = tables.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for table in &tables {
            for name in &table.columns {
                if !index.contains_key(name) {
                    index.insert(name.clone(), columns.len());
                    columns.push(name.clone());
                }
            }
        }

        let width = columns.len();
        let total_rows = tables.iter().map(|t| t.rows.len()).sum();
        let mut rows = Vec::with_capacity(total_rows);

        for table in tables {
            let targets: Vec<usize> = table.columns.iter().map(|c| index[c]).collect();
            for source_row in table.rows {
                let mut row = vec![Value::Null; width];
                for (value, &target) in source_row.into_iter().zip(&targets) {
                    row[target] = value;
                }
                rows.push(row);
            }
        }

        Self { columns, rows }
    }

    /// Set `name` to `value` on every row, appending the column if missing.
    pub fn with_constant_column(mut self, name: &str, value: Value) -> Self {
        match self.column_index(name) {
            Some(i) => {
                for row in &mut self.rows {
                    row[i] = value.clone();
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
        self
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidthMismatch {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let i = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[i]).collect())
    }

    /// A single cell by row index and column name.
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let i = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> NormalizedTable {
        let mut t = NormalizedTable::new(columns.iter().map(|c| c.to_string()).collect()).unwrap();
        for row in rows {
            t.push_row(row).unwrap();
        }
        t
    }

    #[test]
    fn push_row_rejects_wrong_width() {
        let mut t = table(&["a", "b"], vec![]);
        let err = t.push_row(vec![Value::Int(1)]).unwrap_err();
        assert_eq!(
            err,
            TableError::RowWidthMismatch {
                row: 0,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn duplicate_columns_rejected() {
        let err = NormalizedTable::new(vec!["a".into(), "a".into()]).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("a".into()));
    }

    #[test]
    fn concat_unions_columns_and_fills_nulls() {
        let left = table(&["a", "b"], vec![vec![Value::Int(1), Value::Int(2)]]);
        let right = table(
            &["a", "c"],
            vec![
                vec![Value::Int(3), Value::from("x")],
                vec![Value::Int(4), Value::from("y")],
            ],
        );

        let combined = NormalizedTable::concat([left, right]);

        assert_eq!(combined.columns(), ["a", "b", "c"]);
        assert_eq!(combined.row_count(), 3);
        assert_eq!(combined.get(0, "c"), Some(&Value::Null));
        assert_eq!(combined.get(1, "b"), Some(&Value::Null));
        assert_eq!(combined.get(2, "c"), Some(&Value::from("y")));
    }

    #[test]
    fn concat_keeps_input_row_order_and_duplicates() {
        let first = table(&["a"], vec![vec![Value::Int(1)]]);
        let second = table(&["a"], vec![vec![Value::Int(1)]]);
        let combined = NormalizedTable::concat([first, second]);
        let values: Vec<&Value> = combined.column_values("a").unwrap();
        assert_eq!(values, vec![&Value::Int(1), &Value::Int(1)]);
    }

    #[test]
    fn from_records_unions_keys_in_first_seen_order() {
        let t = NormalizedTable::from_records(vec![
            vec![("x".into(), Value::Int(1)), ("y".into(), Value::Int(2))],
            vec![("z".into(), Value::Int(3)), ("x".into(), Value::Int(4))],
        ]);
        assert_eq!(t.columns(), ["x", "y", "z"]);
        assert_eq!(t.rows()[1], vec![Value::Int(4), Value::Null, Value::Int(3)]);
    }

    #[test]
    fn constant_column_appends_then_overwrites() {
        let t = table(&["a"], vec![vec![Value::Int(1)], vec![Value::Int(2)]])
            .with_constant_column("source", Value::from("wind"));
        assert_eq!(t.columns(), ["a", "source"]);
        assert_eq!(t.get(1, "source"), Some(&Value::from("wind")));

        let t = t.with_constant_column("source", Value::from("solar"));
        assert_eq!(t.column_count(), 2);
        assert_eq!(t.get(0, "source"), Some(&Value::from("solar")));
    }
}
