//! Database models for warehouse price rows.
//!
//! Dates are stored as `YYYY-MM-DD` TEXT and decimals as their string
//! representation; conversion happens at this boundary. A domain record
//! that cannot be represented as a row (missing date, blank ticker) fails
//! conversion per record, which the repository reports as that record's
//! upsert failure.

use chrono::NaiveDate;
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use tickerflow_core::prices::PriceRecord;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database model for a persisted price row.
#[derive(Queryable, Identifiable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceRowDb {
    pub id: i32,
    pub ticker: String,
    pub date: String,
    pub open: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
    pub close: Option<String>,
    pub volume: Option<i64>,
    pub daily_range: Option<String>,
    pub daily_return: Option<String>,
    pub updated_at: String,
}

impl From<PriceRowDb> for PriceRecord {
    fn from(row: PriceRowDb) -> Self {
        PriceRecord {
            ticker: row.ticker.into(),
            date: NaiveDate::parse_from_str(&row.date, DATE_FORMAT).ok(),
            open: row.open.as_deref().and_then(|s| Decimal::from_str(s).ok()),
            high: row.high.as_deref().and_then(|s| Decimal::from_str(s).ok()),
            low: row.low.as_deref().and_then(|s| Decimal::from_str(s).ok()),
            close: row.close.as_deref().and_then(|s| Decimal::from_str(s).ok()),
            volume: row.volume,
            daily_range: row
                .daily_range
                .as_deref()
                .and_then(|s| Decimal::from_str(s).ok()),
            daily_return: row
                .daily_return
                .as_deref()
                .and_then(|s| Decimal::from_str(s).ok()),
        }
    }
}

/// Insert/update model for a price row (the surrogate id is
/// server-assigned).
#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewPriceRow {
    pub ticker: String,
    pub date: String,
    pub open: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
    pub close: Option<String>,
    pub volume: Option<i64>,
    pub daily_range: Option<String>,
    pub daily_return: Option<String>,
    pub updated_at: String,
}

impl NewPriceRow {
    /// Converts a domain record into a row, stamping `updated_at`.
    ///
    /// Fails when the record has no natural key to write under.
    pub fn from_record(
        record: &PriceRecord,
        updated_at: &str,
    ) -> std::result::Result<Self, String> {
        if record.ticker.is_blank() {
            return Err("record has a blank ticker".to_string());
        }
        let Some(date) = record.date else {
            return Err("record has no parseable date".to_string());
        };

        Ok(Self {
            ticker: record.ticker.to_string(),
            date: date.format(DATE_FORMAT).to_string(),
            open: record.open.map(|d| d.to_string()),
            high: record.high.map(|d| d.to_string()),
            low: record.low.map(|d| d.to_string()),
            close: record.close.map(|d| d.to_string()),
            volume: record.volume,
            daily_range: record.daily_range.map(|d| d.to_string()),
            daily_return: record.daily_return.map(|d| d.to_string()),
            updated_at: updated_at.to_string(),
        })
    }
}
