//! SQLite-backed implementation of the warehouse price store.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::dsl::{count_distinct, max, min};
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use tickerflow_core::errors::Result;
use tickerflow_core::prices::{
    ChunkOutcome, PriceRecord, PriceStore, RowFailure, WarehouseStats,
};

use super::model::{NewPriceRow, PriceRowDb, DATE_FORMAT};
use crate::db::{get_connection, DbPool};
use crate::errors::{IntoCore, StorageError};
use crate::schema::prices;
use crate::schema::prices::dsl;

/// Price store persisting to the `prices` table.
pub struct SqlitePriceStore {
    pool: Arc<DbPool>,
}

impl SqlitePriceStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Looks up a single persisted record by its natural key. Used by
    /// callers that need to inspect what a load actually wrote.
    pub fn get_by_key(&self, ticker: &str, date: NaiveDate) -> Result<Option<PriceRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let row: Option<PriceRowDb> = dsl::prices
            .filter(dsl::ticker.eq(ticker))
            .filter(dsl::date.eq(date.format(DATE_FORMAT).to_string()))
            .select(PriceRowDb::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(PriceRecord::from))
    }

    fn upsert_record(
        conn: &mut diesel::sqlite::SqliteConnection,
        record: &PriceRecord,
        stamped_at: &str,
    ) -> std::result::Result<bool, String> {
        let row = NewPriceRow::from_record(record, stamped_at)?;

        let existing: i64 = dsl::prices
            .filter(dsl::ticker.eq(&row.ticker))
            .filter(dsl::date.eq(&row.date))
            .count()
            .get_result(conn)
            .map_err(|e| e.to_string())?;

        diesel::insert_into(prices::table)
            .values(&row)
            .on_conflict((dsl::ticker, dsl::date))
            .do_update()
            .set(&row)
            .execute(conn)
            .map_err(|e| e.to_string())?;

        Ok(existing > 0)
    }
}

#[async_trait]
impl PriceStore for SqlitePriceStore {
    async fn upsert_chunk(&self, records: &[PriceRecord]) -> Result<ChunkOutcome> {
        let mut conn = get_connection(&self.pool)?;
        let stamped_at = Utc::now().to_rfc3339();

        let outcome = conn
            .immediate_transaction::<_, StorageError, _>(|conn| {
                let mut outcome = ChunkOutcome::default();
                for (index, record) in records.iter().enumerate() {
                    match Self::upsert_record(conn, record, &stamped_at) {
                        Ok(true) => outcome.updated += 1,
                        Ok(false) => outcome.inserted += 1,
                        Err(message) => {
                            outcome.failed += 1;
                            outcome.failures.push(RowFailure {
                                index,
                                ticker: record.ticker.to_string(),
                                date: record.date,
                                message,
                            });
                        }
                    }
                }
                Ok(outcome)
            })
            .into_core()?;

        debug!(
            "Chunk committed: {} inserted, {} updated, {} failed",
            outcome.inserted, outcome.updated, outcome.failed
        );
        Ok(outcome)
    }

    fn last_loaded_date(&self) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        let latest: Option<String> = dsl::prices
            .select(max(dsl::date))
            .first(&mut conn)
            .into_core()?;
        // Dates are stored as %Y-%m-%d TEXT, so lexicographic MAX is
        // chronological MAX.
        Ok(latest.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()))
    }

    fn table_stats(&self) -> Result<WarehouseStats> {
        let mut conn = get_connection(&self.pool)?;

        let total_rows: i64 = dsl::prices.count().get_result(&mut conn).into_core()?;
        let unique_tickers: i64 = dsl::prices
            .select(count_distinct(dsl::ticker))
            .get_result(&mut conn)
            .into_core()?;
        let (min_date, max_date): (Option<String>, Option<String>) = dsl::prices
            .select((min(dsl::date), max(dsl::date)))
            .first(&mut conn)
            .into_core()?;

        Ok(WarehouseStats {
            total_rows,
            unique_tickers,
            min_date: min_date.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()),
            max_date: max_date.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()),
        })
    }
}
