//! Price record domain model.
//!
//! A `PriceRecord` is one row of daily time-series price data, keyed by
//! `(ticker, date)`. Value cells are `Option`-typed: source datasets carry
//! missing and unparseable cells, and those must survive until the quality
//! validator has counted and excised them. Downstream of `clean()`, the
//! date and the four price cells are always present and positive.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{RecordKey, Ticker};

/// One daily OHLCV row, optionally decorated with derived fields.
///
/// # Fields
///
/// * `ticker` - Equity symbol, natural-key half
/// * `date` - Trading day, natural-key half; `None` when the source cell
///   did not parse
/// * `open`, `high`, `low`, `close` - Daily prices
/// * `volume` - Shares traded
/// * `daily_range` - `high - low`, set by [`compute_derived`]
/// * `daily_return` - Percent change of `close` against the prior
///   chronological record of the same ticker; `None` for a ticker's first
///   record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub ticker: Ticker,
    pub date: Option<NaiveDate>,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<i64>,
    pub daily_range: Option<Decimal>,
    pub daily_return: Option<Decimal>,
}

impl PriceRecord {
    /// Returns the natural key of this record.
    pub fn key(&self) -> RecordKey {
        (self.ticker.clone(), self.date)
    }

    /// Returns true if any of the four price cells or the volume cell
    /// holds a negative value.
    pub fn has_negative_value(&self) -> bool {
        let neg_price = [self.open, self.high, self.low, self.close]
            .iter()
            .any(|v| v.is_some_and(|d| d < Decimal::ZERO));
        neg_price || self.volume.is_some_and(|v| v < 0)
    }

    /// Returns true if both `high` and `low` are present and `high < low`.
    pub fn is_range_inverted(&self) -> bool {
        match (self.high, self.low) {
            (Some(high), Some(low)) => high < low,
            _ => false,
        }
    }
}

/// Sorts a record set by `(ticker, date)` and fills in the derived fields.
///
/// `daily_range` is `high - low` where both cells are present.
/// `daily_return` is the percent change of `close` against the previous
/// dated record of the same ticker; a ticker's first record (and any record
/// without a date or close) is left as `None`. Records without a date do
/// not participate in the return chain, and a dated record with a missing
/// close interrupts it: the record that follows such a gap also gets `None`
/// rather than a return spanning multiple days.
pub fn compute_derived(mut records: Vec<PriceRecord>) -> Vec<PriceRecord> {
    records.sort_by(|a, b| a.key().cmp(&b.key()));

    let mut prev: Option<(Ticker, Decimal)> = None;
    for record in records.iter_mut() {
        record.daily_range = match (record.high, record.low) {
            (Some(high), Some(low)) => Some(high - low),
            _ => None,
        };

        if record.date.is_none() {
            continue;
        }
        record.daily_return = match (&prev, record.close) {
            (Some((ticker, prev_close)), Some(close))
                if *ticker == record.ticker && !prev_close.is_zero() =>
            {
                Some((close - prev_close) / prev_close * Decimal::ONE_HUNDRED)
            }
            _ => None,
        };
        // A dated record with no close breaks the chain: the record after
        // a gap has nothing to be compared against.
        prev = record.close.map(|close| (record.ticker.clone(), close));
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(ticker: &str, date: Option<NaiveDate>, close: Decimal) -> PriceRecord {
        PriceRecord {
            ticker: ticker.into(),
            date,
            open: Some(close),
            high: Some(close + dec!(1)),
            low: Some(close - dec!(1)),
            close: Some(close),
            volume: Some(1_000),
            ..Default::default()
        }
    }

    fn day(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_compute_derived_range_and_return() {
        let records = vec![
            record("AAA", day(2024, 1, 2), dec!(110)),
            record("AAA", day(2024, 1, 1), dec!(100)),
        ];

        let decorated = compute_derived(records);

        // Sorted chronologically per ticker.
        assert_eq!(decorated[0].date, day(2024, 1, 1));
        assert_eq!(decorated[0].daily_range, Some(dec!(2)));
        assert_eq!(decorated[0].daily_return, None);

        assert_eq!(decorated[1].date, day(2024, 1, 2));
        assert_eq!(decorated[1].daily_return, Some(dec!(10)));
    }

    #[test]
    fn test_compute_derived_return_does_not_cross_tickers() {
        let records = vec![
            record("AAA", day(2024, 1, 1), dec!(100)),
            record("BBB", day(2024, 1, 2), dec!(50)),
        ];

        let decorated = compute_derived(records);
        assert_eq!(decorated[1].ticker.as_str(), "BBB");
        assert_eq!(decorated[1].daily_return, None);
    }

    #[test]
    fn test_compute_derived_skips_undated_records() {
        let records = vec![
            record("AAA", None, dec!(90)),
            record("AAA", day(2024, 1, 1), dec!(100)),
            record("AAA", day(2024, 1, 2), dec!(110)),
        ];

        let decorated = compute_derived(records);
        // The undated record neither receives nor seeds a return.
        assert_eq!(decorated[0].date, None);
        assert_eq!(decorated[0].daily_return, None);
        assert_eq!(decorated[2].daily_return, Some(dec!(10)));
    }

    #[test]
    fn test_compute_derived_missing_close_breaks_return_chain() {
        let mut gapped = record("AAA", day(2024, 1, 2), dec!(105));
        gapped.close = None;

        let records = vec![
            record("AAA", day(2024, 1, 1), dec!(100)),
            gapped,
            record("AAA", day(2024, 1, 3), dec!(110)),
        ];

        let decorated = compute_derived(records);
        assert_eq!(decorated[1].daily_return, None);
        // The record after the gap has no prior close to compare against:
        // no return spanning Jan 1 -> Jan 3.
        assert_eq!(decorated[2].daily_return, None);
    }

    #[test]
    fn test_negative_and_inverted_checks() {
        let mut r = record("AAA", day(2024, 1, 1), dec!(100));
        assert!(!r.has_negative_value());
        assert!(!r.is_range_inverted());

        r.low = Some(dec!(-1));
        assert!(r.has_negative_value());

        r.low = Some(dec!(200));
        assert!(r.is_range_inverted());
    }
}
