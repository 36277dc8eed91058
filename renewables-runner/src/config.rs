//! Run configuration handed from the command line to the orchestrator.

use renewables_core::{ApiEndpoint, OutputFormat, RangeRequest, SourceSelection};
use std::path::PathBuf;

/// Lookback used when neither a start date nor a lookback is given.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;

/// Concurrent day fetches per source.
pub const DEFAULT_PARTITION_CONCURRENCY: usize = 4;

/// Everything one run needs. Built once in `main` and passed down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Sources to fetch.
    pub sources: SourceSelection,

    /// Unresolved range inputs; resolved once per run.
    pub range: RangeRequest,

    /// Directory every output file is written to (created if missing).
    pub output_dir: PathBuf,

    /// Output file format, shared by all jobs and the combined table.
    pub format: OutputFormat,

    /// Merge the successful source tables into one extra output.
    pub combine: bool,

    /// Provider base URL and API key.
    pub endpoint: ApiEndpoint,

    /// Maximum concurrent day fetches per source. 1 fetches sequentially.
    pub partition_concurrency: usize,
}

impl RunConfig {
    pub fn new(sources: SourceSelection, endpoint: ApiEndpoint) -> Self {
        Self {
            sources,
            range: RangeRequest::lookback(DEFAULT_LOOKBACK_DAYS),
            output_dir: PathBuf::from("output"),
            format: OutputFormat::default(),
            combine: false,
            endpoint,
            partition_concurrency: DEFAULT_PARTITION_CONCURRENCY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RunConfig::new(SourceSelection::Wind, ApiEndpoint::new("localhost", "k"));
        assert_eq!(config.range.lookback_days, 7);
        assert_eq!(config.format, OutputFormat::Parquet);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert!(!config.combine);
        assert_eq!(config.partition_concurrency, 4);
    }
}
