//! Extract → Transform → Load contract for one source.
//!
//! `SourcePipeline` is a closed set of variants, one per source. Each stage
//! takes the previous stage's output by value and returns the next one, so
//! stages can only run in order and a pipeline holds no state between them.

use renewables_core::connector::{solar, wind};
use renewables_core::naming::source_output_path;
use renewables_core::writer::write_table;
use renewables_core::{
    ApiEndpoint, DateRange, ExtractError, LoadError, NormalizedTable, OutputFormat,
    PartitionFetcher, RawRecord, SourceKind, TransformError, Transport,
};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::job::JobResult;

/// Pipeline stage, for error attribution and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Extract,
    Transform,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Load => "load",
        })
    }
}

/// Shared, read-only inputs of every job in a run.
#[derive(Clone, Copy)]
pub struct JobContext<'a> {
    pub transport: &'a dyn Transport,
    pub endpoint: &'a ApiEndpoint,
    pub range: DateRange,
    pub output_dir: &'a Path,
    pub format: OutputFormat,
    pub partition_concurrency: usize,
}

impl JobContext<'_> {
    /// Where `kind`'s job writes its table.
    pub fn output_path(&self, kind: SourceKind) -> std::path::PathBuf {
        source_output_path(self.output_dir, kind, &self.range, self.format)
    }
}

/// The per-source stage implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePipeline {
    Wind,
    Solar,
}

impl SourcePipeline {
    pub fn for_kind(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Wind => SourcePipeline::Wind,
            SourceKind::Solar => SourcePipeline::Solar,
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            SourcePipeline::Wind => SourceKind::Wind,
            SourcePipeline::Solar => SourceKind::Solar,
        }
    }

    /// One GET per day of the range, partitions in day order.
    pub fn extract(&self, ctx: &JobContext<'_>) -> Result<RawRecord, ExtractError> {
        let fetcher = PartitionFetcher::new(ctx.transport, ctx.endpoint, ctx.partition_concurrency);
        match self {
            SourcePipeline::Wind => wind::extract(&fetcher, &ctx.range).map(RawRecord::Wind),
            SourcePipeline::Solar => solar::extract(&fetcher, &ctx.range).map(RawRecord::Solar),
        }
    }

    /// Map raw partitions into the canonical table. Pure.
    pub fn transform(&self, raw: RawRecord) -> Result<NormalizedTable, TransformError> {
        match (self, raw) {
            (SourcePipeline::Wind, RawRecord::Wind(parts)) => wind::normalize(&parts),
            (SourcePipeline::Solar, RawRecord::Solar(parts)) => solar::normalize(&parts),
            (pipeline, raw) => Err(TransformError::UnexpectedPayload {
                pipeline: pipeline.kind(),
                payload: raw.kind(),
            }),
        }
    }

    /// Write the table and describe the output. `elapsed` is left at zero
    /// for the job runner to fill in.
    pub fn load(
        &self,
        table: NormalizedTable,
        ctx: &JobContext<'_>,
    ) -> Result<JobResult, LoadError> {
        let output_path = ctx.output_path(self.kind());
        write_table(&table, &output_path, ctx.format)?;
        Ok(JobResult {
            source: self.kind(),
            table,
            output_path,
            elapsed: Duration::ZERO,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_matches_kind() {
        for kind in SourceKind::ALL {
            assert_eq!(SourcePipeline::for_kind(kind).kind(), kind);
        }
    }

    #[test]
    fn transform_rejects_foreign_payload() {
        let err = SourcePipeline::Wind
            .transform(RawRecord::Solar(Vec::new()))
            .unwrap_err();
        assert_eq!(
            err,
            TransformError::UnexpectedPayload {
                pipeline: SourceKind::Wind,
                payload: SourceKind::Solar,
            }
        );
    }

    #[test]
    fn stage_names() {
        assert_eq!(Stage::Extract.to_string(), "extract");
        assert_eq!(Stage::Load.to_string(), "load");
    }
}
