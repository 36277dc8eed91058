//! Renewables Core: data model, source connectors, transport, and writers.
//!
//! This crate contains everything a single source pipeline touches:
//! - Date ranges and the filename/partition policy
//! - Source kinds and per-source connectors (wind CSV, solar JSON)
//! - The HTTP transport seam with 429 backoff
//! - The normalized table shared by every source
//! - CSV and Parquet writers with atomic finalization
//! - The stage error taxonomy (extract, transform, load)

pub mod connector;
pub mod error;
pub mod naming;
pub mod normalize;
pub mod range;
pub mod source;
pub mod table;
pub mod transport;
pub mod writer;

pub use connector::{ApiEndpoint, PartitionFetcher, RawRecord, SolarPartition, WindPartition};
pub use error::{ExtractError, LoadError, TransformError};
pub use naming::{combined_output_path, output_file_name, source_output_path, OutputFormat};
pub use range::{DateRange, RangeError, RangeRequest};
pub use source::{SourceKind, SourceSelection};
pub use table::{NormalizedTable, TableError, Value};
pub use transport::{HttpResponse, HttpTransport, RetryPolicy, Transport, TransportError};
pub use writer::write_table;
