//! Job runner: drive one source's pipeline through its three stages.

use renewables_core::{ExtractError, LoadError, NormalizedTable, SourceKind, TransformError};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;

use crate::pipeline::{JobContext, SourcePipeline, Stage};

/// A source's normalized table and where it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub source: SourceKind,
    pub table: NormalizedTable,
    pub output_path: PathBuf,
    pub elapsed: Duration,
}

/// Error from whichever stage failed.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl StageError {
    pub fn stage(&self) -> Stage {
        match self {
            StageError::Extract(_) => Stage::Extract,
            StageError::Transform(_) => Stage::Transform,
            StageError::Load(_) => Stage::Load,
        }
    }
}

/// A failed job, tagged with its source and the stage that failed.
#[derive(Debug, Error)]
#[error("{kind} {stage} failed: {error}")]
pub struct JobError {
    pub kind: SourceKind,
    pub stage: Stage,
    #[source]
    pub error: StageError,
    pub elapsed: Duration,
}

/// Run extract, transform and load for `kind`, stopping at the first failure.
///
/// On success exactly one file exists at the returned path; on failure no
/// file is written for this job.
pub fn run_job(kind: SourceKind, ctx: &JobContext<'_>) -> Result<JobResult, JobError> {
    let started = Instant::now();
    let pipeline = SourcePipeline::for_kind(kind);
    let fail = |error: StageError| JobError {
        kind,
        stage: error.stage(),
        error,
        elapsed: started.elapsed(),
    };

    info!(source = %kind, range = %ctx.range, "extracting");
    let raw = pipeline.extract(ctx).map_err(|e| fail(e.into()))?;

    info!(
        source = %kind,
        partitions = raw.partition_count(),
        records = raw.record_count(),
        "transforming"
    );
    let table = pipeline.transform(raw).map_err(|e| fail(e.into()))?;

    info!(source = %kind, rows = table.row_count(), format = %ctx.format, "loading");
    let mut result = pipeline.load(table, ctx).map_err(|e| fail(e.into()))?;
    result.elapsed = started.elapsed();

    info!(
        source = %kind,
        path = %result.output_path.display(),
        elapsed_secs = result.elapsed.as_secs_f64(),
        "job finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn stage_error_knows_its_stage() {
        let err: StageError = TransformError::MissingField {
            field: "value".into(),
            row: 0,
        }
        .into();
        assert_eq!(err.stage(), Stage::Transform);

        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let err: StageError = ExtractError::Unauthorized { date }.into();
        assert_eq!(err.stage(), Stage::Extract);
    }

    #[test]
    fn job_error_message_names_source_and_stage() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let err = JobError {
            kind: SourceKind::Solar,
            stage: Stage::Extract,
            error: ExtractError::HttpStatus { date, status: 502 }.into(),
            elapsed: Duration::ZERO,
        };
        assert_eq!(
            err.to_string(),
            "solar extract failed: failed to retrieve content for 2023-01-01 (HTTP 502)"
        );
    }
}
