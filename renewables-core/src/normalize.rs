//! Canonical schema and the field-level conversions shared by connectors.
//!
//! Both sources deliver the same logical fields under slightly different
//! spellings and encodings. Column names are sanitized (trimmed, spaces to
//! underscores, lowercased), `naive_timestamp` becomes `timestamp_utc`, and
//! the required fields are typed:
//!
//! | column              | type      |
//! |---------------------|-----------|
//! | `timestamp_utc`     | timestamp |
//! | `variable`          | int       |
//! | `value`             | float     |
//! | `last_modified_utc` | timestamp |
//!
//! Any other field passes through with its sanitized name and an inferred
//! scalar type.

use crate::error::TransformError;
use crate::table::{NormalizedTable, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

pub const NAIVE_TIMESTAMP: &str = "naive_timestamp";
pub const TIMESTAMP_UTC: &str = "timestamp_utc";
pub const VARIABLE: &str = "variable";
pub const VALUE: &str = "value";
pub const LAST_MODIFIED_UTC: &str = "last_modified_utc";

/// Column added to the combined table to tell sources apart.
pub const SOURCE: &str = "source";

/// Fields every raw record must carry (sanitized names).
pub const REQUIRED_FIELDS: [&str; 4] = [NAIVE_TIMESTAMP, VARIABLE, VALUE, LAST_MODIFIED_UTC];

const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A raw cell as it came off the wire.
#[derive(Debug, Clone, Copy)]
pub enum Cell<'a> {
    /// Delimited text (wind).
    Text(&'a str),
    /// Structured JSON scalar (solar).
    Json(&'a serde_json::Value),
}

impl Cell<'_> {
    fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.to_string(),
            Cell::Json(v) => v.to_string(),
        }
    }
}

/// `" Last Modified utc"` → `"last_modified_utc"`
pub fn sanitize_column_name(raw: &str) -> String {
    raw.trim().replace(' ', "_").to_lowercase()
}

/// Column order of every normalized table before any pass-through fields.
pub fn canonical_columns() -> Vec<String> {
    [TIMESTAMP_UTC, VARIABLE, VALUE, LAST_MODIFIED_UTC]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

/// Map one raw record (already sanitized names) into canonical fields.
///
/// Required fields come out first in canonical order, followed by the
/// remaining fields in input order.
pub fn canonical_record(
    fields: Vec<(String, Cell<'_>)>,
    row: usize,
) -> Result<Vec<(String, Value)>, TransformError> {
    let mut out = Vec::with_capacity(fields.len());
    for required in REQUIRED_FIELDS {
        let (name, cell) = fields
            .iter()
            .find(|(name, _)| name == required)
            .ok_or_else(|| TransformError::MissingField {
                field: required.to_string(),
                row,
            })?;
        out.push(convert_field(name, *cell, row)?);
    }

    for (name, cell) in &fields {
        if !REQUIRED_FIELDS.contains(&name.as_str()) {
            out.push(convert_field(name, *cell, row)?);
        }
    }
    Ok(out)
}

/// Assemble canonical records into a table. No records still yields the
/// canonical columns.
pub fn build_table(records: Vec<Vec<(String, Value)>>) -> NormalizedTable {
    if records.is_empty() {
        return NormalizedTable::from_columns(canonical_columns());
    }
    NormalizedTable::from_records(records)
}

fn convert_field(name: &str, cell: Cell<'_>, row: usize) -> Result<(String, Value), TransformError> {
    let invalid = || TransformError::InvalidValue {
        field: name.to_string(),
        row,
        value: cell.display(),
    };
    let converted = match field_kind(name) {
        FieldKind::Timestamp => (
            TIMESTAMP_UTC.to_string(),
            Value::Timestamp(timestamp_cell(cell).ok_or_else(invalid)?),
        ),
        FieldKind::LastModified => (
            name.to_string(),
            Value::Timestamp(timestamp_cell(cell).ok_or_else(invalid)?),
        ),
        FieldKind::Variable => (name.to_string(), Value::Int(int_cell(cell).ok_or_else(invalid)?)),
        FieldKind::Value => (name.to_string(), Value::Float(float_cell(cell).ok_or_else(invalid)?)),
        FieldKind::Passthrough => {
            let v = match cell {
                Cell::Text(s) => infer_scalar(s),
                Cell::Json(v) => json_scalar(v),
            };
            (name.to_string(), v)
        }
    };
    Ok(converted)
}

enum FieldKind {
    Timestamp,
    LastModified,
    Variable,
    Value,
    Passthrough,
}

fn field_kind(name: &str) -> FieldKind {
    match name {
        NAIVE_TIMESTAMP => FieldKind::Timestamp,
        LAST_MODIFIED_UTC => FieldKind::LastModified,
        VARIABLE => FieldKind::Variable,
        VALUE => FieldKind::Value,
        _ => FieldKind::Passthrough,
    }
}

fn timestamp_cell(cell: Cell<'_>) -> Option<DateTime<Utc>> {
    match cell {
        Cell::Text(s) => parse_timestamp(s),
        Cell::Json(serde_json::Value::String(s)) => parse_timestamp(s),
        Cell::Json(v) => {
            let millis = v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64))?;
            DateTime::from_timestamp_millis(millis)
        }
    }
}

/// Integers, or floats with no fractional part (`729.0`).
fn int_cell(cell: Cell<'_>) -> Option<i64> {
    match cell {
        Cell::Text(s) => parse_int(s),
        Cell::Json(serde_json::Value::String(s)) => parse_int(s),
        Cell::Json(v) => v.as_i64().or_else(|| v.as_f64().and_then(integral)),
    }
}

fn parse_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    s.parse()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(integral))
}

fn integral(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn float_cell(cell: Cell<'_>) -> Option<f64> {
    match cell {
        Cell::Text(s) => s.trim().parse().ok(),
        Cell::Json(serde_json::Value::String(s)) => s.trim().parse().ok(),
        Cell::Json(v) => v.as_f64(),
    }
}

/// Parse a date or datetime string as UTC.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS[.fff]]` (space or `T`), with or
/// without a `+HH:MM` offset, and bare `YYYY-MM-DD` (midnight). Strings
/// without an offset are taken to be UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Best-effort typing of a delimited cell: int, then float, then text.
pub fn infer_scalar(raw: &str) -> Value {
    let s = raw.trim();
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(v) = s.parse::<i64>() {
        return Value::Int(v);
    }
    if let Ok(v) = s.parse::<f64>() {
        return Value::Float(v);
    }
    Value::Text(s.to_string())
}

/// Convert a JSON scalar. Arrays and objects are kept as their JSON text.
pub fn json_scalar(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}
