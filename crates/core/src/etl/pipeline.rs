//! ETL pipeline orchestrator.
//!
//! Sequences one run: fetch → validate → incrementally filter → batch
//! upsert → summarize. Each stage hands the record set to the next; a
//! fatal error at any stage stops the clock, records the error, and
//! surfaces to the caller with the partial metrics snapshot attached.
//! The orchestrator performs no retries of its own.

use log::{error, info, warn};
use std::sync::Arc;

use super::batch::BatchUpsertEngine;
use super::config::EtlConfig;
use super::incremental::{filter_since, resolve_watermark};
use super::metrics::{EtlMetrics, RunSummary};
use super::validator::DataQualityValidator;
use crate::errors::{Error, Result};
use crate::prices::{PriceFetcher, PriceStore};

/// Orchestrates one ETL run against a source fetcher and a destination
/// store.
///
/// The destination connection behind `store` is exclusively owned by one
/// run at a time; runs are sequential, never concurrent.
pub struct EtlPipeline {
    fetcher: Arc<dyn PriceFetcher>,
    store: Arc<dyn PriceStore>,
    config: EtlConfig,
    validator: DataQualityValidator,
}

impl EtlPipeline {
    pub fn new(
        fetcher: Arc<dyn PriceFetcher>,
        store: Arc<dyn PriceStore>,
        config: EtlConfig,
    ) -> Self {
        Self {
            fetcher,
            store,
            config,
            validator: DataQualityValidator::new(),
        }
    }

    /// Runs the complete pipeline and returns the run's metrics snapshot.
    ///
    /// On a fatal error the run is reported failed via
    /// [`Error::RunFailed`], which still carries the snapshot accumulated
    /// up to the failure. Recoverable conditions (watermark or stats query
    /// failures, per-record upsert failures, data quality issues) never
    /// reach this boundary; they are visible only in the summary and logs.
    pub async fn run(&self) -> Result<RunSummary> {
        info!("Starting ETL pipeline");
        let mut metrics = EtlMetrics::new();
        metrics.start();

        match self.run_stages(&mut metrics).await {
            Ok(()) => {
                metrics.stop();
                metrics.log_summary();
                Ok(metrics.summary())
            }
            Err(e) => {
                metrics.stop();
                metrics.add_error(format!("Pipeline failed: {}", e));
                error!("ETL pipeline failed: {}", e);
                Err(Error::RunFailed {
                    message: e.to_string(),
                    summary: Box::new(metrics.summary()),
                })
            }
        }
    }

    async fn run_stages(&self, metrics: &mut EtlMetrics) -> Result<()> {
        // Fetch. Zero input means there is nothing useful to do.
        info!("[step 1] Fetching records from source...");
        let mut records = self.fetcher.fetch().await?;
        if records.is_empty() {
            return Err(Error::Fetch(
                "source returned no records or data is empty".to_string(),
            ));
        }
        metrics.rows_fetched = records.len();
        info!("Fetched {} rows from source", records.len());

        // Validate, cleaning only when issues were found.
        if self.config.enable_validation {
            info!("[step 2] Validating data quality...");
            let report = self.validator.validate(&records);
            if report.has_issues() {
                warn!("Data quality issues detected - cleaning data...");
                records = self.validator.clean(records);
            }
        }
        metrics.rows_validated = records.len();

        // Incrementally filter against the warehouse watermark.
        if self.config.incremental {
            info!("[step 3] Checking for incremental load...");
            let watermark = resolve_watermark(self.store.as_ref(), metrics);
            records = filter_since(records, watermark);

            if records.is_empty() {
                // A no-op run is a success, not a failure.
                info!("No new data to load");
                self.summarize(metrics);
                return Ok(());
            }
        } else {
            info!("[step 3] Performing full load (incremental disabled)");
        }

        // Upsert in chunks.
        info!("[step 4] Processing {} rows in chunks...", records.len());
        let engine = BatchUpsertEngine::new(self.config.batch_size, self.config.batch_pause);
        let totals = engine
            .upsert_all(&records, self.store.as_ref(), metrics)
            .await;
        metrics.rows_inserted = totals.inserted;
        metrics.rows_updated = totals.updated;
        metrics.rows_failed = totals.failed;

        // Destination-side statistics, purely for observability.
        info!("[step 5] Retrieving warehouse statistics...");
        self.summarize(metrics);

        Ok(())
    }

    /// Logs destination aggregate statistics. A failed stats query is
    /// recorded as a warning and never fails the run.
    fn summarize(&self, metrics: &mut EtlMetrics) {
        match self.store.table_stats() {
            Ok(stats) => {
                info!("Warehouse table statistics");
                info!("  total rows: {}", stats.total_rows);
                info!("  unique tickers: {}", stats.unique_tickers);
                info!(
                    "  date range: {} to {}",
                    stats
                        .min_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "N/A".to_string()),
                    stats
                        .max_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "N/A".to_string()),
                );
            }
            Err(e) => {
                warn!("Could not retrieve warehouse statistics: {}", e);
                metrics.add_warning(format!("Could not retrieve warehouse statistics: {}", e));
            }
        }
    }
}
