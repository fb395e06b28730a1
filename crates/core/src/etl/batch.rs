//! Chunked batch upsert engine.
//!
//! Partitions a record set into fixed-size chunks and delegates each chunk
//! to the destination store, which commits it as a single transaction.
//! Record-level failures come back in the chunk outcome and are absorbed
//! into metrics; a chunk-level failure accounts for every record in that
//! chunk. One bad row never aborts the batch.

use log::{error, info};
use std::time::Duration;

use super::metrics::EtlMetrics;
use crate::prices::{PriceRecord, PriceStore};

pub const DEFAULT_CHUNK_SIZE: usize = 1_000;
pub const DEFAULT_CHUNK_PAUSE: Duration = Duration::from_millis(100);

/// Aggregate counts across all chunks of one upsert pass.
///
/// Invariant: `inserted + updated + failed` equals the input length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertTotals {
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Splits record sets into chunks and drives per-chunk upserts.
#[derive(Debug, Clone)]
pub struct BatchUpsertEngine {
    chunk_size: usize,
    pause: Duration,
}

impl Default for BatchUpsertEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_PAUSE)
    }
}

impl BatchUpsertEngine {
    /// Creates an engine with the given chunk size and inter-chunk pause.
    ///
    /// A zero chunk size is clamped to 1. The pause bounds destination
    /// load between chunks; pass `Duration::ZERO` to skip it (tests do).
    pub fn new(chunk_size: usize, pause: Duration) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            pause,
        }
    }

    /// Upserts the whole record set chunk by chunk.
    ///
    /// Exactly `ceil(len / chunk_size)` chunks are attempted. A chunk-level
    /// error from the store counts the entire chunk as failed and is
    /// recorded in metrics; per-record failures inside a committed chunk
    /// are recorded individually with their row context.
    pub async fn upsert_all(
        &self,
        records: &[PriceRecord],
        store: &dyn PriceStore,
        metrics: &mut EtlMetrics,
    ) -> UpsertTotals {
        let mut totals = UpsertTotals::default();
        let chunk_count = records.len().div_ceil(self.chunk_size);

        info!(
            "Processing {} rows in {} chunks of up to {}",
            records.len(),
            chunk_count,
            self.chunk_size
        );

        for (chunk_num, chunk) in records.chunks(self.chunk_size).enumerate() {
            info!("Processing chunk {} ({} rows)...", chunk_num + 1, chunk.len());

            match store.upsert_chunk(chunk).await {
                Ok(outcome) => {
                    totals.inserted += outcome.inserted;
                    totals.updated += outcome.updated;
                    totals.failed += outcome.failed;
                    for failure in &outcome.failures {
                        error!("{}", failure);
                        metrics.add_error(failure.to_string());
                    }
                    info!(
                        "Chunk {} complete: {} inserted, {} updated, {} failed",
                        chunk_num + 1,
                        outcome.inserted,
                        outcome.updated,
                        outcome.failed
                    );
                }
                Err(e) => {
                    // Connection-level failure: the whole chunk is lost.
                    totals.failed += chunk.len();
                    let message =
                        format!("Chunk {} failed ({} rows): {}", chunk_num + 1, chunk.len(), e);
                    error!("{}", message);
                    metrics.add_error(message);
                }
            }

            let more_chunks_remain = chunk_num + 1 < chunk_count;
            if more_chunks_remain && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
        }

        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DatabaseError, Result};
    use crate::prices::{ChunkOutcome, RowFailure, WarehouseStats};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    /// In-memory store that records chunk sizes and can be programmed to
    /// fail a whole chunk or individual rows.
    #[derive(Default)]
    struct MockPriceStore {
        chunk_sizes: Mutex<Vec<usize>>,
        fail_chunk_at: Option<usize>,
        fail_rows_with_undated: bool,
    }

    #[async_trait]
    impl PriceStore for MockPriceStore {
        async fn upsert_chunk(&self, records: &[PriceRecord]) -> Result<ChunkOutcome> {
            let mut sizes = self.chunk_sizes.lock().unwrap();
            let chunk_index = sizes.len();
            sizes.push(records.len());

            if self.fail_chunk_at == Some(chunk_index) {
                return Err(DatabaseError::TransactionFailed("connection lost".into()).into());
            }

            let mut outcome = ChunkOutcome::default();
            for (i, record) in records.iter().enumerate() {
                if self.fail_rows_with_undated && record.date.is_none() {
                    outcome.failed += 1;
                    outcome.failures.push(RowFailure {
                        index: i,
                        ticker: record.ticker.to_string(),
                        date: record.date,
                        message: "NOT NULL constraint failed: prices.date".into(),
                    });
                } else {
                    outcome.inserted += 1;
                }
            }
            Ok(outcome)
        }

        fn last_loaded_date(&self) -> Result<Option<NaiveDate>> {
            Ok(None)
        }

        fn table_stats(&self) -> Result<WarehouseStats> {
            Ok(WarehouseStats::default())
        }
    }

    fn records(n: usize) -> Vec<PriceRecord> {
        (0..n)
            .map(|i| PriceRecord {
                ticker: "AAA".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .map(|d| d + chrono::Days::new(i as u64)),
                open: Some(dec!(10)),
                high: Some(dec!(11)),
                low: Some(dec!(9)),
                close: Some(dec!(10)),
                volume: Some(100),
                ..Default::default()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_chunk_count_and_sum_invariant() {
        let store = MockPriceStore::default();
        let engine = BatchUpsertEngine::new(4, Duration::ZERO);
        let mut metrics = EtlMetrics::new();

        let input = records(10);
        let totals = engine.upsert_all(&input, &store, &mut metrics).await;

        // ceil(10 / 4) = 3 chunks.
        assert_eq!(store.chunk_sizes.lock().unwrap().as_slice(), &[4, 4, 2]);
        assert_eq!(totals.inserted + totals.updated + totals.failed, 10);
        assert_eq!(totals.failed, 0);
    }

    #[tokio::test]
    async fn test_chunk_level_failure_counts_whole_chunk() {
        let store = MockPriceStore {
            fail_chunk_at: Some(1),
            ..Default::default()
        };
        let engine = BatchUpsertEngine::new(4, Duration::ZERO);
        let mut metrics = EtlMetrics::new();

        let totals = engine.upsert_all(&records(10), &store, &mut metrics).await;

        assert_eq!(totals.inserted, 6);
        assert_eq!(totals.failed, 4);
        assert_eq!(totals.inserted + totals.updated + totals.failed, 10);
        assert_eq!(metrics.errors().len(), 1);
        assert!(metrics.errors()[0].message.contains("Chunk 2 failed"));
    }

    #[tokio::test]
    async fn test_per_record_failure_is_isolated() {
        let store = MockPriceStore {
            fail_rows_with_undated: true,
            ..Default::default()
        };
        let engine = BatchUpsertEngine::new(10, Duration::ZERO);
        let mut metrics = EtlMetrics::new();

        let mut input = records(3);
        input[1].date = None;
        let totals = engine.upsert_all(&input, &store, &mut metrics).await;

        assert_eq!(totals.inserted, 2);
        assert_eq!(totals.updated, 0);
        assert_eq!(totals.failed, 1);
        assert_eq!(metrics.errors().len(), 1);
        assert!(metrics.errors()[0].message.contains("AAA"));
    }

    #[tokio::test]
    async fn test_empty_input_attempts_no_chunks() {
        let store = MockPriceStore::default();
        let engine = BatchUpsertEngine::default();
        let mut metrics = EtlMetrics::new();

        let totals = engine.upsert_all(&[], &store, &mut metrics).await;
        assert_eq!(totals, UpsertTotals::default());
        assert!(store.chunk_sizes.lock().unwrap().is_empty());
    }
}
