//! SQLite storage backend for the tickerflow warehouse.
//!
//! Implements the `PriceStore` trait from `tickerflow-core` on top of
//! Diesel and an r2d2 connection pool, with embedded migrations.

pub mod db;
pub mod errors;
pub mod prices;
pub mod schema;

pub use db::{create_pool, get_connection, get_db_path, init, run_migrations, DbPool};
pub use errors::StorageError;
pub use prices::SqlitePriceStore;
