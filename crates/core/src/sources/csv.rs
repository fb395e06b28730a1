//! File-backed price record source.
//!
//! Reads a daily-prices dataset export (one row per ticker per day, with
//! `date,open,high,low,close,volume,name` headers) into [`PriceRecord`]s.
//! Cell parsing is lenient: a bad or empty cell becomes `None` and is left
//! for the quality validator to count and excise. After parsing, the set
//! is decorated with the derived fields.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::info;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::{Error, Result};
use crate::prices::{compute_derived, PriceFetcher, PriceRecord};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fetches price records from a CSV file on disk.
pub struct CsvPriceFetcher {
    path: PathBuf,
}

impl CsvPriceFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PriceFetcher for CsvPriceFetcher {
    async fn fetch(&self) -> Result<Vec<PriceRecord>> {
        info!("Loading data from: {}", self.path.display());

        let mut reader = csv::Reader::from_path(&self.path)
            .map_err(|e| Error::Fetch(format!("{}: {}", self.path.display(), e)))?;

        let headers = reader
            .headers()
            .map_err(|e| Error::Fetch(e.to_string()))?
            .clone();
        let columns = ColumnIndexes::resolve(&headers)?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| Error::Fetch(e.to_string()))?;
            records.push(columns.parse_row(&row));
        }

        info!("Loaded {} rows from {}", records.len(), self.path.display());
        Ok(compute_derived(records))
    }
}

/// Resolved positions of the canonical columns within the header row.
struct ColumnIndexes {
    ticker: usize,
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl ColumnIndexes {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| Error::Fetch(format!("missing column '{}' in source file", name)))
        };

        Ok(Self {
            ticker: find("name")?,
            date: find("date")?,
            open: find("open")?,
            high: find("high")?,
            low: find("low")?,
            close: find("close")?,
            volume: find("volume")?,
        })
    }

    fn parse_row(&self, row: &csv::StringRecord) -> PriceRecord {
        PriceRecord {
            ticker: row.get(self.ticker).unwrap_or("").trim().into(),
            date: cell(row, self.date)
                .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok()),
            open: cell(row, self.open).and_then(|s| Decimal::from_str(s).ok()),
            high: cell(row, self.high).and_then(|s| Decimal::from_str(s).ok()),
            low: cell(row, self.low).and_then(|s| Decimal::from_str(s).ok()),
            close: cell(row, self.close).and_then(|s| Decimal::from_str(s).ok()),
            volume: cell(row, self.volume).and_then(|s| s.parse().ok()),
            daily_range: None,
            daily_return: None,
        }
    }
}

fn cell<'a>(row: &'a csv::StringRecord, index: usize) -> Option<&'a str> {
    row.get(index).map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_fetch_parses_and_decorates() {
        let file = write_csv(
            "date,open,high,low,close,volume,Name\n\
             2024-01-02,101,112,99,110,2000,AAA\n\
             2024-01-01,100,111,98,100,1000,AAA\n",
        );

        let records = CsvPriceFetcher::new(file.path()).fetch().await.unwrap();
        assert_eq!(records.len(), 2);

        // Sorted chronologically with derived fields filled in.
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(records[0].daily_range, Some(dec!(13)));
        assert_eq!(records[0].daily_return, None);
        assert_eq!(records[1].daily_return, Some(dec!(10)));
        assert_eq!(records[1].volume, Some(2000));
    }

    #[tokio::test]
    async fn test_bad_cells_become_none() {
        let file = write_csv(
            "date,open,high,low,close,volume,Name\n\
             not-a-date,abc,112,99,110,,AAA\n",
        );

        let records = CsvPriceFetcher::new(file.path()).fetch().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, None);
        assert_eq!(records[0].open, None);
        assert_eq!(records[0].high, Some(dec!(112)));
        assert_eq!(records[0].volume, None);
    }

    #[tokio::test]
    async fn test_missing_column_is_a_fetch_error() {
        let file = write_csv("date,open,high,low,close,volume\n2024-01-01,1,2,1,2,10\n");
        let result = CsvPriceFetcher::new(file.path()).fetch().await;
        assert!(matches!(result, Err(Error::Fetch(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_a_fetch_error() {
        let result = CsvPriceFetcher::new("/nonexistent/prices.csv").fetch().await;
        assert!(matches!(result, Err(Error::Fetch(_))));
    }
}
