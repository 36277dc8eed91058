//! Solar connector: one `application/json` array of objects per day.

use super::PartitionFetcher;
use crate::error::{ExtractError, TransformError};
use crate::normalize::{build_table, canonical_record, sanitize_column_name, Cell};
use crate::range::DateRange;
use crate::source::SourceKind;
use crate::table::NormalizedTable;
use chrono::NaiveDate;
use serde_json::{Map, Value as Json};

/// A solar record with nested objects flattened to `parent_child` keys.
pub type SolarRecord = Vec<(String, Json)>;

/// One day of solar data.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarPartition {
    pub date: NaiveDate,
    pub records: Vec<SolarRecord>,
}

/// Fetch the solar JSON for every day of `range`.
pub fn extract(
    fetcher: &PartitionFetcher<'_>,
    range: &DateRange,
) -> Result<Vec<SolarPartition>, ExtractError> {
    fetcher.fetch(SourceKind::Solar, range, parse_partition)
}

/// Parse one day's JSON body. Anything other than an array of objects is
/// malformed.
pub fn parse_partition(date: NaiveDate, body: &str) -> Result<SolarPartition, ExtractError> {
    let malformed = |reason: String| ExtractError::MalformedPayload { date, reason };

    let doc: Json = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    let Json::Array(items) = doc else {
        return Err(malformed("expected a JSON array".into()));
    };

    let records = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Json::Object(map) => {
                let mut record = Vec::with_capacity(map.len());
                flatten_into(None, map, &mut record);
                Ok(record)
            }
            other => Err(malformed(format!(
                "element {i} is not an object: {other}"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SolarPartition { date, records })
}

fn flatten_into(prefix: Option<&str>, map: Map<String, Json>, out: &mut SolarRecord) {
    for (key, value) in map {
        let key = match prefix {
            Some(parent) => format!("{parent}_{key}"),
            None => key,
        };
        match value {
            Json::Object(nested) => flatten_into(Some(&key), nested, out),
            scalar => out.push((key, scalar)),
        }
    }
}

/// Map solar partitions into the canonical table. Timestamps are epoch
/// milliseconds.
pub fn normalize(partitions: &[SolarPartition]) -> Result<NormalizedTable, TransformError> {
    let mut records = Vec::new();
    let mut row_index = 0;

    for record in partitions.iter().flat_map(|p| &p.records) {
        let fields = record
            .iter()
            .map(|(key, value)| (sanitize_column_name(key), Cell::Json(value)))
            .collect();
        records.push(canonical_record(fields, row_index)?);
        row_index += 1;
    }

    Ok(build_table(records))
}
