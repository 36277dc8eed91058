//! Union of the successful source tables.

use renewables_core::naming::combined_output_path;
use renewables_core::normalize::SOURCE;
use renewables_core::writer::write_table;
use renewables_core::{DateRange, LoadError, NormalizedTable, OutputFormat, SourceKind, Value};
use std::path::{Path, PathBuf};

/// The combined table and where it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedResult {
    pub table: NormalizedTable,
    pub output_path: PathBuf,
}

/// Tag each table with a `source` column and concatenate them in the given
/// order. Columns are unioned in first-seen order; rows are not deduplicated.
pub fn combine_tables<I>(tables: I) -> NormalizedTable
where
    I: IntoIterator<Item = (SourceKind, NormalizedTable)>,
{
    NormalizedTable::concat(
        tables
            .into_iter()
            .map(|(kind, table)| table.with_constant_column(SOURCE, Value::from(kind.name()))),
    )
}

/// Combine and write to `combined_<startEpoch>_<endEpoch>.<ext>`.
pub fn combine_and_load(
    tables: Vec<(SourceKind, NormalizedTable)>,
    output_dir: &Path,
    range: &DateRange,
    format: OutputFormat,
) -> Result<CombinedResult, LoadError> {
    let table = combine_tables(tables);
    let output_path = combined_output_path(output_dir, range, format);
    write_table(&table, &output_path, format)?;
    Ok(CombinedResult { table, output_path })
}
