//! Wind connector: one `text/csv` document per day.

use super::PartitionFetcher;
use crate::error::{ExtractError, TransformError};
use crate::normalize::{build_table, canonical_record, sanitize_column_name, Cell};
use crate::range::DateRange;
use crate::source::SourceKind;
use crate::table::NormalizedTable;
use chrono::NaiveDate;

/// One day of wind data: the header row and every data row, as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindPartition {
    pub date: NaiveDate,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Fetch the wind CSV for every day of `range`.
pub fn extract(
    fetcher: &PartitionFetcher<'_>,
    range: &DateRange,
) -> Result<Vec<WindPartition>, ExtractError> {
    fetcher.fetch(SourceKind::Wind, range, parse_partition)
}

/// Parse one day's CSV body. Rows of the wrong width are malformed.
pub fn parse_partition(date: NaiveDate, body: &str) -> Result<WindPartition, ExtractError> {
    let malformed = |e: csv::Error| ExtractError::MalformedPayload {
        date,
        reason: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(WindPartition {
        date,
        headers,
        rows,
    })
}

/// Map wind partitions into the canonical table.
///
/// Row numbers in errors count across all partitions, in day order.
pub fn normalize(partitions: &[WindPartition]) -> Result<NormalizedTable, TransformError> {
    let mut records = Vec::new();
    let mut row_index = 0;

    for partition in partitions {
        let headers: Vec<String> = partition
            .headers
            .iter()
            .map(|h| sanitize_column_name(h))
            .collect();

        for row in &partition.rows {
            let fields = headers
                .iter()
                .zip(row)
                .map(|(name, cell)| (name.clone(), Cell::Text(cell)))
                .collect();
            records.push(canonical_record(fields, row_index)?);
            row_index += 1;
        }
    }

    Ok(build_table(records))
}
