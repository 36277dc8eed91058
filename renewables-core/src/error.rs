//! Stage error taxonomy.
//!
//! Each pipeline stage has its own error type so a failure can always be
//! attributed to extract, transform, or load. None of them carry the source
//! identity; the job runner adds that when it wraps them.

use crate::naming::OutputFormat;
use crate::source::SourceKind;
use crate::transport::TransportError;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while fetching the raw partitions for a range.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("request for {date} failed: {source}")]
    Transport {
        date: NaiveDate,
        #[source]
        source: TransportError,
    },

    #[error("API key is invalid for {date} (HTTP 403)")]
    Unauthorized { date: NaiveDate },

    #[error("failed to retrieve content for {date} (HTTP {status})")]
    HttpStatus { date: NaiveDate, status: u16 },

    #[error("unexpected content type for {date}: expected {expected}, got '{actual}'")]
    UnexpectedContentType {
        date: NaiveDate,
        expected: &'static str,
        actual: String,
    },

    #[error("malformed payload for {date}: {reason}")]
    MalformedPayload { date: NaiveDate, reason: String },

    #[error("failed to start partition workers: {0}")]
    WorkerPool(String),
}

/// Failures while mapping raw payloads into the canonical schema.
#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("missing required field '{field}' (row {row})")]
    MissingField { field: String, row: usize },

    #[error("cannot parse {field} value '{value}' at row {row}")]
    InvalidValue {
        field: String,
        row: usize,
        value: String,
    },

    #[error("{pipeline} pipeline received a {payload} payload")]
    UnexpectedPayload {
        pipeline: SourceKind,
        payload: SourceKind,
    },
}

/// Failures while writing a table to disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{format} encoding failed for {}: {reason}", path.display())]
    Encode {
        path: PathBuf,
        format: OutputFormat,
        reason: String,
    },

    #[error("failed to finalize {}: {source}", path.display())]
    Finalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
