//! Filename policy for job and combined outputs.
//!
//! Names are `<name>_<startEpoch>_<endEpoch>.<ext>` where the epochs are UTC
//! midnight of the range bounds, so the same logical range always maps to
//! the same file and a re-run overwrites instead of duplicating.

use crate::range::DateRange;
use crate::source::SourceKind;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name prefix of the combined output.
pub const COMBINED_NAME: &str = "combined";

/// File format written by the load stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Csv,
    #[default]
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(format!(
                "invalid output format [{other}]. Must be one of: csv, parquet"
            )),
        }
    }
}

/// `<name>_<startEpoch>_<endEpoch>.<ext>`
pub fn output_file_name(name: &str, range: &DateRange, format: OutputFormat) -> String {
    format!(
        "{name}_{}_{}.{}",
        range.start_epoch(),
        range.end_epoch(),
        format.extension()
    )
}

/// Output path for one source's job.
pub fn source_output_path(
    dir: &Path,
    kind: SourceKind,
    range: &DateRange,
    format: OutputFormat,
) -> PathBuf {
    dir.join(output_file_name(kind.name(), range, format))
}

/// Output path for the combined table.
pub fn combined_output_path(dir: &Path, range: &DateRange, format: OutputFormat) -> PathBuf {
    dir.join(output_file_name(COMBINED_NAME, range, format))
}
