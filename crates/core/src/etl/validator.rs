//! Data quality validation for price record batches.
//!
//! `validate` scans a batch once and reports structural defects without
//! mutating anything; `clean` deterministically excises defective records.
//! No single issue category is fatal: the report is advisory input to the
//! pipeline's decision to clean.

use log::{info, warn};
use std::collections::HashMap;

use crate::prices::{PriceRecord, RecordKey};

// =============================================================================
// Validation Report
// =============================================================================

/// Per-column missing-value counts for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingValueCounts {
    pub date: usize,
    pub open: usize,
    pub high: usize,
    pub low: usize,
    pub close: usize,
    pub volume: usize,
}

impl MissingValueCounts {
    pub fn total(&self) -> usize {
        self.date + self.open + self.high + self.low + self.close + self.volume
    }
}

/// Issues found in a batch of price records.
///
/// # Fields
///
/// * `duplicates` - Natural keys of every record belonging to a
///   `(ticker, date)` group of size > 1
/// * `missing_values` - Per-column missing-cell counts
/// * `invalid_dates` - Records with a missing or unparseable date
/// * `negative_values` - Records with a negative value in any of
///   open/high/low/close/volume
/// * `outliers` - Records where `high < low`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub duplicates: Vec<RecordKey>,
    pub missing_values: MissingValueCounts,
    pub invalid_dates: usize,
    pub negative_values: usize,
    pub outliers: usize,
}

impl ValidationReport {
    /// Returns true if any issue category is non-empty.
    pub fn has_issues(&self) -> bool {
        !self.duplicates.is_empty()
            || self.missing_values.total() > 0
            || self.invalid_dates > 0
            || self.negative_values > 0
            || self.outliers > 0
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Validates and cleans price record batches before insertion.
#[derive(Debug, Clone, Default)]
pub struct DataQualityValidator;

impl DataQualityValidator {
    pub fn new() -> Self {
        Self
    }

    /// Scans the batch once and reports issues without mutating it.
    pub fn validate(&self, records: &[PriceRecord]) -> ValidationReport {
        let mut report = ValidationReport::default();

        let mut key_counts: HashMap<RecordKey, usize> = HashMap::new();
        for record in records {
            *key_counts.entry(record.key()).or_insert(0) += 1;
        }
        for record in records {
            if key_counts[&record.key()] > 1 {
                report.duplicates.push(record.key());
            }
        }
        if !report.duplicates.is_empty() {
            warn!("Found {} duplicate records", report.duplicates.len());
        }

        for record in records {
            if record.date.is_none() {
                report.missing_values.date += 1;
            }
            if record.open.is_none() {
                report.missing_values.open += 1;
            }
            if record.high.is_none() {
                report.missing_values.high += 1;
            }
            if record.low.is_none() {
                report.missing_values.low += 1;
            }
            if record.close.is_none() {
                report.missing_values.close += 1;
            }
            if record.volume.is_none() {
                report.missing_values.volume += 1;
            }
        }

        report.invalid_dates = records.iter().filter(|r| r.date.is_none()).count();
        if report.invalid_dates > 0 {
            warn!("Found {} records with invalid dates", report.invalid_dates);
        }

        report.negative_values = records.iter().filter(|r| r.has_negative_value()).count();
        if report.negative_values > 0 {
            warn!(
                "Found {} records with negative values",
                report.negative_values
            );
        }

        report.outliers = records.iter().filter(|r| r.is_range_inverted()).count();
        if report.outliers > 0 {
            warn!("Found {} records where high < low", report.outliers);
        }

        report
    }

    /// Removes defective records, in order: natural-key duplicates (keeping
    /// the last-seen occurrence under input ordering), missing dates,
    /// non-positive prices, and inverted high/low ranges.
    ///
    /// Idempotent: cleaning an already-clean set changes nothing.
    pub fn clean(&self, records: Vec<PriceRecord>) -> Vec<PriceRecord> {
        let original_count = records.len();

        let mut last_index: HashMap<RecordKey, usize> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            last_index.insert(record.key(), i);
        }

        let survivors: Vec<PriceRecord> = records
            .into_iter()
            .enumerate()
            .filter(|(i, record)| last_index[&record.key()] == *i)
            .map(|(_, record)| record)
            .filter(|record| record.date.is_some())
            .filter(|record| {
                [record.open, record.high, record.low, record.close]
                    .iter()
                    .all(|v| v.is_some_and(|d| d > rust_decimal::Decimal::ZERO))
            })
            .filter(|record| !record.is_range_inverted())
            .collect();

        let removed = original_count - survivors.len();
        if removed > 0 {
            info!(
                "Cleaned data: removed {} invalid records ({} -> {})",
                removed,
                original_count,
                survivors.len()
            );
        }

        survivors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::Ticker;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 1, d)
    }

    fn valid(ticker: &str, d: u32) -> PriceRecord {
        PriceRecord {
            ticker: ticker.into(),
            date: day(d),
            open: Some(dec!(10)),
            high: Some(dec!(12)),
            low: Some(dec!(9)),
            close: Some(dec!(11)),
            volume: Some(5_000),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_reports_duplicates() {
        let records = vec![valid("AAA", 1), valid("AAA", 1), valid("AAA", 2)];
        let report = DataQualityValidator::new().validate(&records);

        // Both members of the duplicated group are listed.
        assert_eq!(report.duplicates.len(), 2);
        assert!(report.has_issues());
    }

    #[test]
    fn test_validate_reports_missing_and_invalid() {
        let mut broken = valid("BBB", 3);
        broken.date = None;
        broken.close = None;

        let report = DataQualityValidator::new().validate(&[valid("AAA", 1), broken]);
        assert_eq!(report.missing_values.date, 1);
        assert_eq!(report.missing_values.close, 1);
        assert_eq!(report.missing_values.open, 0);
        assert_eq!(report.invalid_dates, 1);
    }

    #[test]
    fn test_validate_reports_outliers() {
        let mut inverted = valid("AAA", 2);
        inverted.high = Some(dec!(5));
        inverted.low = Some(dec!(10));

        let records = vec![valid("AAA", 1), inverted, valid("BBB", 1), valid("CCC", 1)];
        let report = DataQualityValidator::new().validate(&records);
        assert_eq!(report.outliers, 1);

        let cleaned = DataQualityValidator::new().clean(records);
        assert_eq!(cleaned.len(), 3);
    }

    #[test]
    fn test_validate_reports_negative_values() {
        let mut negative = valid("AAA", 1);
        negative.volume = Some(-10);
        let report = DataQualityValidator::new().validate(&[negative]);
        assert_eq!(report.negative_values, 1);
    }

    #[test]
    fn test_clean_keeps_last_duplicate() {
        let mut first = valid("AAA", 1);
        first.close = Some(dec!(100));
        let mut second = valid("AAA", 1);
        second.close = Some(dec!(200));

        let cleaned = DataQualityValidator::new().clean(vec![first, second]);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].close, Some(dec!(200)));
    }

    #[test]
    fn test_clean_drops_missing_date_and_nonpositive_prices() {
        let mut undated = valid("AAA", 1);
        undated.date = None;
        let mut zero_price = valid("BBB", 1);
        zero_price.open = Some(Decimal::ZERO);
        let mut missing_price = valid("CCC", 1);
        missing_price.low = None;

        let cleaned = DataQualityValidator::new().clean(vec![
            undated,
            zero_price,
            missing_price,
            valid("DDD", 1),
        ]);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].ticker, Ticker::new("DDD"));
    }

    #[test]
    fn test_clean_is_idempotent() {
        let mut bad = valid("AAA", 2);
        bad.high = Some(dec!(1));
        bad.low = Some(dec!(2));
        let records = vec![valid("AAA", 1), valid("AAA", 1), bad, valid("BBB", 1)];

        let validator = DataQualityValidator::new();
        let once = validator.clean(records);
        let twice = validator.clean(once.clone());
        assert_eq!(once, twice);
    }

    // Property tests over arbitrary record sets: clean is idempotent and
    // every survivor satisfies the acceptance invariants.

    fn arb_record() -> impl Strategy<Value = PriceRecord> {
        (
            prop_oneof![Just("AAA"), Just("BBB"), Just("CCC")],
            prop_oneof![Just(None), (1u32..=28).prop_map(day)],
            proptest::option::of(-5i64..50),
            proptest::option::of(-5i64..50),
            proptest::option::of(-5i64..50),
            proptest::option::of(-5i64..50),
            proptest::option::of(-100i64..100_000),
        )
            .prop_map(|(ticker, date, open, high, low, close, volume)| PriceRecord {
                ticker: ticker.into(),
                date,
                open: open.map(Decimal::from),
                high: high.map(Decimal::from),
                low: low.map(Decimal::from),
                close: close.map(Decimal::from),
                volume,
                ..Default::default()
            })
    }

    proptest! {
        #[test]
        fn prop_clean_idempotent(records in proptest::collection::vec(arb_record(), 0..40)) {
            let validator = DataQualityValidator::new();
            let once = validator.clean(records);
            let twice = validator.clean(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_clean_postconditions(records in proptest::collection::vec(arb_record(), 0..40)) {
            let validator = DataQualityValidator::new();
            let cleaned = validator.clean(records);

            let mut seen = std::collections::HashSet::new();
            for record in &cleaned {
                prop_assert!(seen.insert(record.key()), "duplicate key survived clean");
                prop_assert!(record.date.is_some());
                prop_assert!(!record.is_range_inverted());
                for price in [record.open, record.high, record.low, record.close] {
                    let price = price.expect("price cell missing after clean");
                    prop_assert!(price > Decimal::ZERO);
                }
            }
        }
    }
}
