//! Renewables CLI: fetch wind and solar telemetry and write csv or parquet.
//!
//! Example:
//! - `renewables --source all --combine-output -f csv --lookback-days 3`
//!
//! Exits with status 1 if any source or the combine step failed.

mod logging;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use renewables_core::{ApiEndpoint, HttpTransport, OutputFormat, RangeRequest, SourceSelection};
use renewables_runner::{Orchestrator, RunConfig, DEFAULT_PARTITION_CONCURRENCY};
use std::path::PathBuf;
use tracing::warn;

use settings::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "renewables",
    version,
    about = "Renewables ETL: fetch wind and solar telemetry and write csv or parquet"
)]
struct Cli {
    /// Source to fetch: wind, solar, or all.
    #[arg(short, long)]
    source: SourceSelection,

    /// Output format: csv or parquet. Defaults to DEFAULT_OUTPUT_FORMAT.
    #[arg(short = 'f', long)]
    output_format: Option<OutputFormat>,

    /// Output directory. Defaults to DEFAULT_OUTPUT_PATH.
    #[arg(short = 'o', long)]
    output_path: Option<PathBuf>,

    /// Also write the successful source tables as one combined file.
    #[arg(long, default_value_t = false)]
    combine_output: bool,

    /// Start date (YYYY-MM-DD). Overrides --lookback-days.
    #[arg(long)]
    start_date: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    end_date: Option<String>,

    /// Days to look back from the end date. Defaults to LOOKBACK_DAYS.
    #[arg(short = 'd', long)]
    lookback_days: Option<u32>,

    /// Concurrent day fetches per source (1 = sequential).
    #[arg(long, default_value_t = DEFAULT_PARTITION_CONCURRENCY)]
    partition_concurrency: usize,
}

impl Cli {
    /// Merge flags over settings. Flags win.
    fn into_run_config(self, settings: &Settings) -> RunConfig {
        let endpoint = ApiEndpoint::new(settings.base_url.as_str(), settings.api_key.as_str());
        let mut config = RunConfig::new(self.source, endpoint);
        config.range = RangeRequest {
            start_date: self.start_date,
            end_date: self.end_date,
            lookback_days: self.lookback_days.unwrap_or(settings.lookback_days),
        };
        config.output_dir = self
            .output_path
            .unwrap_or_else(|| settings.output_path.clone());
        config.format = self.output_format.unwrap_or(settings.output_format);
        config.combine = self.combine_output;
        config.partition_concurrency = self.partition_concurrency;
        config
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = Settings::from_env().context("invalid configuration")?;
    logging::init(settings.log_level);

    if settings.api_key.is_empty() {
        warn!("API_KEY is not set; the provider will likely reject requests");
    }

    let transport =
        HttpTransport::new(settings.retry.clone()).context("failed to set up HTTP transport")?;
    let config = cli.into_run_config(&settings);

    let report = Orchestrator::new(&config, &transport)
        .run()
        .context("cannot resolve date range")?;
    report.log_summary();

    if !report.succeeded() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn defaults() -> Settings {
        Settings::from_lookup(|_| None).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn source_is_required() {
        assert!(Cli::try_parse_from(["renewables"]).is_err());
        assert!(Cli::try_parse_from(["renewables", "-s", "tidal"]).is_err());
    }

    #[test]
    fn settings_fill_unset_flags() {
        let cli = Cli::try_parse_from(["renewables", "--source", "wind"]).unwrap();
        let config = cli.into_run_config(&defaults());

        assert_eq!(config.sources, SourceSelection::Wind);
        assert_eq!(config.range, RangeRequest::lookback(7));
        assert_eq!(config.format, OutputFormat::Parquet);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert!(!config.combine);
        assert_eq!(config.partition_concurrency, 4);
        assert_eq!(config.endpoint.base_url(), "http://localhost:8000");
    }

    #[test]
    fn flags_override_settings() {
        let cli = Cli::try_parse_from([
            "renewables",
            "-s",
            "all",
            "-f",
            "csv",
            "-o",
            "/tmp/out",
            "--combine-output",
            "--start-date",
            "2023-01-01",
            "--end-date",
            "2023-01-02",
            "-d",
            "30",
            "--partition-concurrency",
            "1",
        ])
        .unwrap();
        let config = cli.into_run_config(&defaults());

        assert_eq!(config.sources, SourceSelection::All);
        assert_eq!(config.format, OutputFormat::Csv);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert!(config.combine);
        assert_eq!(config.range.start_date.as_deref(), Some("2023-01-01"));
        assert_eq!(config.range.lookback_days, 30);
        assert_eq!(config.partition_concurrency, 1);
    }

    #[test]
    fn invalid_format_is_rejected() {
        let err = Cli::try_parse_from(["renewables", "-s", "wind", "-f", "xlsx"]).unwrap_err();
        assert!(err.to_string().contains("Must be one of: csv, parquet"));
    }
}
