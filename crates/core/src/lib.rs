//! tickerflow-core - ETL domain entities, services, and traits.
//!
//! This crate contains the pipeline logic for loading daily equity price
//! records into a relational warehouse: data quality validation,
//! incremental filtering, chunked upserts, and per-run metrics. It is
//! database-agnostic and defines traits that are implemented by the
//! `storage-sqlite` crate.

pub mod errors;
pub mod etl;
pub mod prices;
pub mod sources;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
