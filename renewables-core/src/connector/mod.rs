//! Source connectors: URL templates, per-day fetching, payload parsing.
//!
//! The remote API is partitioned by calendar day. A connector issues one GET
//! per day of the range and parses each body into its raw partition shape.
//! Days can be fetched concurrently on a small private rayon pool; results
//! always come back in ascending day order.

pub mod solar;
pub mod wind;

pub use solar::SolarPartition;
pub use wind::WindPartition;

use crate::error::ExtractError;
use crate::range::{DateRange, DATE_FORMAT};
use crate::source::SourceKind;
use crate::transport::Transport;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::fmt;
use tracing::debug;

/// Base URL and credentials of the provider API.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    base_url: String,
    api_key: String,
}

impl ApiEndpoint {
    /// A base URL without a scheme is assumed to be plain `http://`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };

        Self {
            base_url,
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/<YYYY-MM-DD>/renewables/<resource>?api_key=<key>`
    pub fn partition_url(&self, kind: SourceKind, date: NaiveDate) -> String {
        format!(
            "{}/{}/renewables/{}?api_key={}",
            self.base_url,
            date.format(DATE_FORMAT),
            kind.resource(),
            self.api_key
        )
    }
}

// Keep the key out of logs and panic messages.
impl fmt::Debug for ApiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiEndpoint")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Raw extract output, tagged by source. Partitions are in day order.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Wind(Vec<WindPartition>),
    Solar(Vec<SolarPartition>),
}

impl RawRecord {
    pub fn kind(&self) -> SourceKind {
        match self {
            RawRecord::Wind(_) => SourceKind::Wind,
            RawRecord::Solar(_) => SourceKind::Solar,
        }
    }

    pub fn partition_count(&self) -> usize {
        match self {
            RawRecord::Wind(parts) => parts.len(),
            RawRecord::Solar(parts) => parts.len(),
        }
    }

    /// Total raw rows across all partitions.
    pub fn record_count(&self) -> usize {
        match self {
            RawRecord::Wind(parts) => parts.iter().map(|p| p.rows.len()).sum(),
            RawRecord::Solar(parts) => parts.iter().map(|p| p.records.len()).sum(),
        }
    }
}

/// Fetch every daily partition of a range through a shared transport.
pub struct PartitionFetcher<'a> {
    transport: &'a dyn Transport,
    endpoint: &'a ApiEndpoint,
    concurrency: usize,
}

impl<'a> PartitionFetcher<'a> {
    /// `concurrency` of 0 or 1 fetches days one after another.
    pub fn new(transport: &'a dyn Transport, endpoint: &'a ApiEndpoint, concurrency: usize) -> Self {
        Self {
            transport,
            endpoint,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch and parse each day of `range`, returning partitions in day order.
    ///
    /// Stops at the first failing day when sequential. When concurrent, the
    /// error of some failing day is returned and the other results dropped.
    pub fn fetch<T, F>(
        &self,
        kind: SourceKind,
        range: &DateRange,
        parse: F,
    ) -> Result<Vec<T>, ExtractError>
    where
        T: Send,
        F: Fn(NaiveDate, &str) -> Result<T, ExtractError> + Sync,
    {
        let days: Vec<NaiveDate> = range.days().collect();
        let fetch_one = |date: NaiveDate| -> Result<T, ExtractError> {
            let body = self.fetch_body(kind, date)?;
            parse(date, &body)
        };

        if self.concurrency == 1 || days.len() < 2 {
            return days.into_iter().map(fetch_one).collect();
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency.min(days.len()))
            .thread_name(move |i| format!("{}-fetch-{i}", kind.name()))
            .build()
            .map_err(|e| ExtractError::WorkerPool(e.to_string()))?;

        pool.install(|| days.par_iter().map(|&date| fetch_one(date)).collect())
    }

    fn fetch_body(&self, kind: SourceKind, date: NaiveDate) -> Result<String, ExtractError> {
        let url = self.endpoint.partition_url(kind, date);
        let response = self
            .transport
            .get(&url)
            .map_err(|source| ExtractError::Transport { date, source })?;

        debug!(
            source = kind.name(),
            %date,
            status = response.status,
            bytes = response.body.len(),
            "fetched partition"
        );

        if response.status == 403 {
            return Err(ExtractError::Unauthorized { date });
        }
        if !response.is_success() {
            return Err(ExtractError::HttpStatus {
                date,
                status: response.status,
            });
        }
        if !response.has_content_type(kind.content_type()) {
            return Err(ExtractError::UnexpectedContentType {
                date,
                expected: kind.content_type(),
                actual: response.content_type.unwrap_or_default(),
            });
        }

        Ok(response.body)
    }
}
