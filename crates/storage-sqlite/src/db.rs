//! Database connection pooling and migrations.

use log::{error, info};
use std::path::Path;
use std::sync::Arc;

use diesel::connection::{Connection, SimpleConnection};
use diesel::r2d2::{self, ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use tickerflow_core::errors::{DatabaseError, Error, Result};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Resolves the warehouse database path: `DATABASE_URL` if set, otherwise
/// `warehouse.db` inside the given data directory.
pub fn get_db_path(data_dir: &str) -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| {
        Path::new(data_dir)
            .join("warehouse.db")
            .to_string_lossy()
            .to_string()
    })
}

/// Applies the baseline PRAGMAs to a fresh database file.
pub fn init(db_path: &str) -> Result<()> {
    if let Some(db_dir) = Path::new(db_path).parent() {
        if !db_dir.exists() {
            std::fs::create_dir_all(db_dir).map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            })?;
        }
    }

    let mut conn = SqliteConnection::establish(db_path)
        .map_err(|e| Error::Database(DatabaseError::ConnectionFailed(e.to_string())))?;
    conn.batch_execute(
        "PRAGMA journal_mode = WAL;\n\
         PRAGMA foreign_keys = ON;\n\
         PRAGMA busy_timeout = 30000;\n\
         PRAGMA synchronous = NORMAL;",
    )
    .map_err(|e| Error::Database(DatabaseError::ConnectionFailed(e.to_string())))?;

    Ok(())
}

pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = r2d2::Pool::builder()
        .max_size(4)
        .min_idle(Some(1))
        .connection_timeout(std::time::Duration::from_secs(30))
        .connection_customizer(Box::new(ConnectionCustomizer {}))
        .build(manager)
        .map_err(|e| Error::Database(DatabaseError::PoolCreationFailed(e.to_string())))?;
    Ok(Arc::new(pool))
}

/// Runs pending embedded migrations. Performed once before a pipeline run;
/// the ETL core itself never touches the schema.
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    info!("Running database migrations");
    let mut connection = get_connection(pool)?;

    let applied = connection.run_pending_migrations(MIGRATIONS).map_err(|e| {
        error!("Database migration failed: {}", e);
        Error::Database(DatabaseError::MigrationFailed(e.to_string()))
    })?;

    if applied.is_empty() {
        info!("No pending migrations to apply.");
    } else {
        for migration_version in &applied {
            info!("Applied migration {}", migration_version);
        }
    }

    Ok(())
}

/// Gets a connection from the pool.
pub fn get_connection(pool: &Pool<ConnectionManager<SqliteConnection>>) -> Result<DbConnection> {
    pool.get()
        .map_err(|e| Error::Database(DatabaseError::PoolCreationFailed(e.to_string())))
}

#[derive(Debug)]
struct ConnectionCustomizer;

impl r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionCustomizer {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        use diesel::RunQueryDsl;

        diesel::sql_query(
            "PRAGMA foreign_keys = ON;\n\
             PRAGMA busy_timeout = 30000;\n\
             PRAGMA synchronous = NORMAL;",
        )
        .execute(conn)
        .map_err(diesel::r2d2::Error::QueryError)?;

        Ok(())
    }
}
