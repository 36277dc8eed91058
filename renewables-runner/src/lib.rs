//! Renewables Runner: pipelines, job runner, orchestration, combine.
//!
//! This crate builds on `renewables-core` to provide:
//! - The per-source Extract → Transform → Load stage contract
//! - A job runner that attributes failures to a source and stage
//! - Concurrent fan-out across sources with a join barrier
//! - The combine step that unions successful source tables
//! - A run report that decides the exit status

pub mod combine;
pub mod config;
pub mod job;
pub mod orchestrator;
pub mod pipeline;
pub mod report;

pub use combine::{combine_and_load, combine_tables, CombinedResult};
pub use config::{RunConfig, DEFAULT_LOOKBACK_DAYS, DEFAULT_PARTITION_CONCURRENCY};
pub use job::{run_job, JobError, JobResult, StageError};
pub use orchestrator::Orchestrator;
pub use pipeline::{JobContext, SourcePipeline, Stage};
pub use report::{CombinedSummary, JobSummary, RunReport};
