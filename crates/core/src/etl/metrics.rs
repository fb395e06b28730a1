//! Run metrics accumulator and serializable summary.
//!
//! One `EtlMetrics` instance is bound to one pipeline invocation: created at
//! run start, finalized at run end, and snapshotted into a [`RunSummary`]
//! for persistence to an external monitoring sink. Error and warning
//! entries are timestamped and append-only.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

// =============================================================================
// Log Entry
// =============================================================================

/// A timestamped error or warning entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogEntry {
    fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Metrics Accumulator
// =============================================================================

/// Tracks counters, wall-clock boundaries, and error/warning entries across
/// one ETL run.
#[derive(Debug, Clone, Default)]
pub struct EtlMetrics {
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    pub rows_fetched: usize,
    pub rows_validated: usize,
    pub rows_inserted: usize,
    pub rows_updated: usize,
    pub rows_failed: usize,
    errors: Vec<LogEntry>,
    warnings: Vec<LogEntry>,
}

impl EtlMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of the run.
    pub fn start(&mut self) {
        self.start_time = Some(Utc::now());
    }

    /// Marks the end of the run.
    pub fn stop(&mut self) {
        self.end_time = Some(Utc::now());
    }

    /// Wall-clock duration in seconds, or zero if either boundary is unset.
    pub fn duration_seconds(&self) -> f64 {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => {
                (end - start).num_milliseconds() as f64 / 1_000.0
            }
            _ => 0.0,
        }
    }

    /// Appends a timestamped error entry. Entries are never removed.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(LogEntry::now(message));
    }

    /// Appends a timestamped warning entry. Entries are never removed.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(LogEntry::now(message));
    }

    pub fn errors(&self) -> &[LogEntry] {
        &self.errors
    }

    pub fn warnings(&self) -> &[LogEntry] {
        &self.warnings
    }

    /// Percentage of fetched rows that landed, `(inserted + updated) /
    /// max(fetched, 1) * 100`. A zero-fetch denominator defaults to 1
    /// rather than dividing by zero.
    pub fn success_rate(&self) -> f64 {
        let landed = (self.rows_inserted + self.rows_updated) as f64;
        let fetched = self.rows_fetched.max(1) as f64;
        landed / fetched * 100.0
    }

    /// Produces an immutable snapshot of all counters, entries, and the
    /// computed duration and success rate.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            start_time: self.start_time,
            end_time: self.end_time,
            duration_seconds: self.duration_seconds(),
            rows_fetched: self.rows_fetched,
            rows_validated: self.rows_validated,
            rows_inserted: self.rows_inserted,
            rows_updated: self.rows_updated,
            rows_failed: self.rows_failed,
            success_rate: (self.success_rate() * 100.0).round() / 100.0,
            errors_count: self.errors.len(),
            warnings_count: self.warnings.len(),
            errors: self.errors.clone(),
            warnings: self.warnings.clone(),
        }
    }

    /// Logs a human-readable summary of the run.
    pub fn log_summary(&self) {
        info!("ETL run metrics");
        info!("  duration: {:.2}s", self.duration_seconds());
        info!("  rows fetched: {}", self.rows_fetched);
        info!("  rows validated: {}", self.rows_validated);
        info!("  rows inserted: {}", self.rows_inserted);
        info!("  rows updated: {}", self.rows_updated);
        info!("  rows failed: {}", self.rows_failed);
        info!("  success rate: {:.2}%", self.success_rate());
        info!("  errors: {}", self.errors.len());
        info!("  warnings: {}", self.warnings.len());
    }
}

// =============================================================================
// Run Summary
// =============================================================================

/// Immutable, serializable snapshot of one run's metrics.
///
/// This is the structured record handed to external monitoring sinks
/// (file, log, metrics endpoint); key names are part of that contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
    pub rows_fetched: usize,
    pub rows_validated: usize,
    pub rows_inserted: usize,
    pub rows_updated: usize,
    pub rows_failed: usize,
    pub success_rate: f64,
    pub errors_count: usize,
    pub warnings_count: usize,
    pub errors: Vec<LogEntry>,
    pub warnings: Vec<LogEntry>,
}
