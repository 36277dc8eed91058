//! Outcome of a whole run.

use renewables_core::{DateRange, LoadError, SourceKind};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

use crate::combine::CombinedResult;
use crate::job::{JobError, JobResult};

/// What the report keeps of a successful job once its table is consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
    pub source: SourceKind,
    pub output_path: PathBuf,
    pub rows: usize,
    pub elapsed: Duration,
}

impl From<&JobResult> for JobSummary {
    fn from(result: &JobResult) -> Self {
        Self {
            source: result.source,
            output_path: result.output_path.clone(),
            rows: result.table.row_count(),
            elapsed: result.elapsed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedSummary {
    pub output_path: PathBuf,
    pub rows: usize,
}

impl From<&CombinedResult> for CombinedSummary {
    fn from(result: &CombinedResult) -> Self {
        Self {
            output_path: result.output_path.clone(),
            rows: result.table.row_count(),
        }
    }
}

/// Per-source outcomes in requested order, plus the combine outcome.
#[derive(Debug)]
pub struct RunReport {
    pub range: DateRange,
    pub jobs: Vec<Result<JobSummary, JobError>>,
    /// `None` when combine was not requested or could not run.
    pub combined: Option<Result<CombinedSummary, LoadError>>,
    pub elapsed: Duration,
}

impl RunReport {
    /// True only if every job succeeded and the combine load, if it ran, did too.
    pub fn succeeded(&self) -> bool {
        self.jobs.iter().all(Result::is_ok) && !matches!(self.combined, Some(Err(_)))
    }

    pub fn successes(&self) -> impl Iterator<Item = &JobSummary> {
        self.jobs.iter().filter_map(|job| job.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobError> {
        self.jobs.iter().filter_map(|job| job.as_ref().err())
    }

    /// Wall time of every job in requested order, failed ones included.
    pub fn timings(&self) -> Vec<(SourceKind, Duration)> {
        self.jobs
            .iter()
            .map(|job| match job {
                Ok(summary) => (summary.source, summary.elapsed),
                Err(e) => (e.kind, e.elapsed),
            })
            .collect()
    }

    /// Every file this run wrote, jobs first then the combined output.
    pub fn output_paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = self.successes().map(|s| s.output_path.as_path()).collect();
        if let Some(Ok(combined)) = &self.combined {
            paths.push(&combined.output_path);
        }
        paths
    }

    /// One line per written file, then a final status line.
    pub fn log_summary(&self) {
        for job in self.successes() {
            info!(
                source = %job.source,
                rows = job.rows,
                path = %job.output_path.display(),
                elapsed_secs = job.elapsed.as_secs_f64(),
                "wrote source output"
            );
        }
        for failure in self.failures() {
            error!(
                source = %failure.kind,
                stage = %failure.stage,
                elapsed_secs = failure.elapsed.as_secs_f64(),
                "source failed"
            );
        }
        if let Some(Ok(combined)) = &self.combined {
            info!(
                rows = combined.rows,
                path = %combined.output_path.display(),
                "wrote combined output"
            );
        }

        let elapsed_secs = self.elapsed.as_secs_f64();
        if self.succeeded() {
            info!(range = %self.range, elapsed_secs, "run succeeded");
        } else {
            error!(
                range = %self.range,
                failed_jobs = self.failures().count(),
                elapsed_secs,
                "run failed"
            );
        }
    }
}
