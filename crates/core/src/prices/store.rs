//! Storage and source traits for price records.
//!
//! These traits abstract the destination warehouse and the dataset source,
//! allowing different backends (e.g., SQLite, PostgreSQL) and sources
//! (CSV file, API client) to be used interchangeably. The ETL pipeline
//! only ever talks to these traits.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use super::model::PriceRecord;
use crate::errors::Result;

// =============================================================================
// Chunk Outcome
// =============================================================================

/// Context for a single record that failed inside an otherwise-committed
/// chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    /// Index of the record within the chunk, for diagnostics.
    pub index: usize,
    pub ticker: String,
    pub date: Option<NaiveDate>,
    pub message: String,
}

impl std::fmt::Display for RowFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let date = self
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "?".to_string());
        write!(
            f,
            "Row {} [{}|{}]: {}",
            self.index, self.ticker, date, self.message
        )
    }
}

/// Result of upserting one chunk of records.
///
/// Invariant: `inserted + updated + failed` equals the chunk length, and
/// `failures.len() == failed`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkOutcome {
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
    pub failures: Vec<RowFailure>,
}

// =============================================================================
// Warehouse Stats
// =============================================================================

/// Destination-side aggregate statistics, queried after a load purely for
/// observability.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseStats {
    pub total_rows: i64,
    pub unique_tickers: i64,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

// =============================================================================
// Price Store
// =============================================================================

/// Storage interface for the destination warehouse table.
///
/// Mutations are async (they involve transactional I/O); the aggregate
/// reads are sync, matching how implementations typically serve them from
/// a pooled connection.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Upserts one chunk of records inside a single transaction.
    ///
    /// Each record is attempted independently, keyed on `(ticker, date)`:
    /// an existing row is updated (value columns plus the last-modified
    /// timestamp), a new key is inserted. A failure on one record is
    /// captured in the returned [`ChunkOutcome`] and does not abort the
    /// rest of the chunk. If the same key appears twice in the chunk, the
    /// later record is applied second and wins.
    ///
    /// Returns `Err` only for a connection-level failure that takes the
    /// whole chunk down; the caller then accounts for every record in the
    /// chunk as failed.
    async fn upsert_chunk(&self, records: &[PriceRecord]) -> Result<ChunkOutcome>;

    /// Returns the maximum persisted date across the whole table, or
    /// `None` if the table holds no rows.
    fn last_loaded_date(&self) -> Result<Option<NaiveDate>>;

    /// Returns aggregate statistics for the table.
    fn table_stats(&self) -> Result<WarehouseStats>;
}

// =============================================================================
// Price Fetcher
// =============================================================================

/// Source interface producing the raw record set for one run.
///
/// Implementations normalize source rows into [`PriceRecord`]s and decorate
/// them with derived fields; the pipeline treats any failure here as fatal
/// to the run.
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<PriceRecord>>;
}
