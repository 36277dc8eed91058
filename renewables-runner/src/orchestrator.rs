//! Fan out one job per source, join them all, then optionally combine.
//!
//! Jobs run on scoped threads and share the transport and context
//! immutably. A failing job never cancels its siblings; every job is joined
//! before the combine step starts.

use chrono::{NaiveDate, Utc};
use renewables_core::{LoadError, NormalizedTable, RangeError, SourceKind, Transport};
use std::thread;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::combine::combine_and_load;
use crate::config::RunConfig;
use crate::job::{run_job, JobError, JobResult};
use crate::pipeline::JobContext;
use crate::report::{CombinedSummary, JobSummary, RunReport};

pub struct Orchestrator<'a> {
    config: &'a RunConfig,
    transport: &'a dyn Transport,
    today: NaiveDate,
}

impl<'a> Orchestrator<'a> {
    /// "Today" is the current UTC calendar date.
    pub fn new(config: &'a RunConfig, transport: &'a dyn Transport) -> Self {
        Self {
            config,
            transport,
            today: Utc::now().date_naive(),
        }
    }

    /// Pin "today" for lookback resolution.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Resolve the range and run every requested source.
    ///
    /// Only an unresolvable range is an `Err`; job and combine failures are
    /// recorded in the report.
    pub fn run(&self) -> Result<RunReport, RangeError> {
        let started = Instant::now();
        let range = self.config.range.resolve(self.today)?;
        let kinds = self.config.sources.kinds();

        info!(
            %range,
            sources = ?kinds.iter().map(SourceKind::name).collect::<Vec<_>>(),
            format = %self.config.format,
            output_dir = %self.config.output_dir.display(),
            "starting run"
        );

        let ctx = JobContext {
            transport: self.transport,
            endpoint: &self.config.endpoint,
            range,
            output_dir: &self.config.output_dir,
            format: self.config.format,
            partition_concurrency: self.config.partition_concurrency,
        };

        let outcomes = run_concurrently(&kinds, &ctx);

        let mut jobs = Vec::with_capacity(outcomes.len());
        let mut tables = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(result) => {
                    jobs.push(Ok(JobSummary::from(&result)));
                    tables.push((result.source, result.table));
                }
                Err(e) => {
                    error!(
                        source = %e.kind,
                        stage = %e.stage,
                        error = %e.error,
                        elapsed_secs = e.elapsed.as_secs_f64(),
                        "job failed"
                    );
                    jobs.push(Err(e));
                }
            }
        }

        let combined = self.combine(kinds.len(), tables, &ctx);

        Ok(RunReport {
            range,
            jobs,
            combined,
            elapsed: started.elapsed(),
        })
    }

    fn combine(
        &self,
        requested: usize,
        tables: Vec<(SourceKind, NormalizedTable)>,
        ctx: &JobContext<'_>,
    ) -> Option<Result<CombinedSummary, LoadError>> {
        if !self.config.combine {
            return None;
        }
        if requested < 2 {
            warn!("combine requested with a single source, skipping");
            return None;
        }
        if tables.len() < 2 {
            warn!(
                succeeded = tables.len(),
                requested, "combine needs at least two successful sources, skipping"
            );
            return None;
        }

        info!(sources = tables.len(), "combining");
        let outcome = combine_and_load(tables, ctx.output_dir, &ctx.range, ctx.format)
            .map(|combined| CombinedSummary::from(&combined));
        if let Err(e) = &outcome {
            error!(stage = "combine", error = %e, "combine failed");
        }
        Some(outcome)
    }
}

/// One scoped thread per source; results come back in `kinds` order.
///
/// A panic inside a job is a bug, not a stage failure, and is re-raised here.
fn run_concurrently(
    kinds: &[SourceKind],
    ctx: &JobContext<'_>,
) -> Vec<Result<JobResult, JobError>> {
    thread::scope(|scope| {
        let handles: Vec<_> = kinds
            .iter()
            .map(|&kind| scope.spawn(move || run_job(kind, ctx)))
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(outcome) => outcome,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}
