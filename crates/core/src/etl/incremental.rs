//! Incremental-load watermark resolution and filtering.
//!
//! The watermark is the maximum date already persisted in the warehouse,
//! scoped to the whole table. It is read once per run; a failed watermark
//! query is recoverable and downgrades the run to a full load.

use chrono::NaiveDate;
use log::{info, warn};

use super::metrics::EtlMetrics;
use crate::prices::{PriceRecord, PriceStore};

/// Resolves the watermark from the destination.
///
/// Returns `None` both when the table is empty (a full load is required)
/// and when the query itself fails; the failure is logged and recorded as a
/// warning but never aborts the run.
pub fn resolve_watermark(store: &dyn PriceStore, metrics: &mut EtlMetrics) -> Option<NaiveDate> {
    match store.last_loaded_date() {
        Ok(Some(date)) => {
            info!("Last loaded date in warehouse: {}", date);
            Some(date)
        }
        Ok(None) => {
            info!("No existing data in warehouse table - full load will be performed");
            None
        }
        Err(e) => {
            warn!("Could not determine last loaded date: {}", e);
            metrics.add_warning(format!("Could not determine last loaded date: {}", e));
            None
        }
    }
}

/// Narrows a record set to entries newer than the watermark.
///
/// With no watermark the input is returned unchanged (full load). With a
/// watermark, only records dated strictly after it survive: a date equal to
/// the watermark is presumed fully loaded already. Records without a
/// parseable date cannot be compared and are excluded in incremental mode.
pub fn filter_since(records: Vec<PriceRecord>, watermark: Option<NaiveDate>) -> Vec<PriceRecord> {
    let Some(watermark) = watermark else {
        info!("Performing full data load");
        return records;
    };

    let total = records.len();
    let newer: Vec<PriceRecord> = records
        .into_iter()
        .filter(|r| r.date.is_some_and(|d| d > watermark))
        .collect();

    info!(
        "Incremental load: filtered {} -> {} new records (after {})",
        total,
        newer.len(),
        watermark
    );

    newer
}
