//! Iseng Storage
//!
//! `SQLite` implementations of the user reader and writer.
//!
//! The service runs with two pools: a writer pool against the primary
//! database, which owns the schema, and a read-only pool that the reader
//! queries. Both may point at the same file.
//!
//! # Example
//!
//! ```rust,no_run
//! use iseng_storage::{create_reader_pool, create_writer_pool, run_migrations};
//! use iseng_storage::{SqlUserReader, SqlUserWriter};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let writer_pool = create_writer_pool("sqlite://iseng.db", 5).await?;
//! run_migrations(&writer_pool).await?;
//! let reader_pool = create_reader_pool("sqlite://iseng.db", 5).await?;
//!
//! let reader = SqlUserReader::new(reader_pool);
//! let writer = SqlUserWriter::new(writer_pool);
//! # Ok(())
//! # }
//! ```

mod error;
mod reader;
mod writer;

// Vertical slices
pub mod users;

pub use error::StorageError;
pub use reader::SqlUserReader;
pub use writer::{SqlTransaction, SqlUserWriter};

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Run database migrations
///
/// Call once against the writer pool before serving requests.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    MIGRATOR.run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Create the pool used for writes
///
/// The database file is created if it does not exist and runs in WAL mode
/// so readers are not blocked by an open write transaction.
///
/// # Errors
///
/// Returns `StorageError::Connection` if the URL is invalid or the database cannot be opened
pub async fn create_writer_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(StorageError::Connection)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(StorageError::Connection)?;

    tracing::info!(url = %database_url, max_connections, "Writer pool created");
    Ok(pool)
}

/// Create the pool used for reads
///
/// Connections are opened read-only, so the database must already exist.
///
/// # Errors
///
/// Returns `StorageError::Connection` if the URL is invalid or the database cannot be opened
pub async fn create_reader_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(StorageError::Connection)?
        .read_only(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(StorageError::Connection)?;

    tracing::info!(url = %database_url, max_connections, "Reader pool created");
    Ok(pool)
}
