//! ETL orchestration: metrics, validation, incremental filtering, batch
//! upserts, and the pipeline that sequences them.

pub mod batch;
pub mod config;
pub mod incremental;
pub mod metrics;
pub mod pipeline;
pub mod validator;

pub use batch::{BatchUpsertEngine, UpsertTotals, DEFAULT_CHUNK_PAUSE, DEFAULT_CHUNK_SIZE};
pub use config::EtlConfig;
pub use incremental::{filter_since, resolve_watermark};
pub use metrics::{EtlMetrics, LogEntry, RunSummary};
pub use pipeline::EtlPipeline;
pub use validator::{DataQualityValidator, MissingValueCounts, ValidationReport};
