use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_LENGTH: usize = 9;

/// Generate a record id: an underscore followed by 9 lowercase alphanumerics.
/// Collisions are not checked.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("_{}", suffix)
}

/// Open the connection pool with WAL journaling and foreign keys enforced
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Start a write transaction that holds the write lock from its first
/// statement. Competing writers wait on the busy timeout.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint could not complete, database is busy")]
    Busy,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Result row of `PRAGMA wal_checkpoint`
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct CheckpointReport {
    pub busy: i64,
    pub log: i64,
    pub checkpointed: i64,
}

async fn wal_checkpoint(pool: &SqlitePool, mode: &str) -> Result<CheckpointReport, sqlx::Error> {
    let sql = format!("PRAGMA wal_checkpoint({})", mode);
    sqlx::query_as(&sql).fetch_one(pool).await
}

/// Flush the write-ahead log into the main database file.
///
/// Must succeed before the database file is copied anywhere. Tries TRUNCATE
/// first and falls back to FULL when TRUNCATE fails or reports busy.
pub async fn checkpoint(pool: &SqlitePool) -> Result<CheckpointReport, CheckpointError> {
    match wal_checkpoint(pool, "TRUNCATE").await {
        Ok(report) if report.busy == 0 => {
            log::info!(
                "Database checkpoint (TRUNCATE) successful: {}/{} frames",
                report.checkpointed,
                report.log
            );
            return Ok(report);
        }
        Ok(_) => log::warn!("Checkpoint (TRUNCATE) reported busy, retrying with FULL"),
        Err(e) => log::warn!("Checkpoint (TRUNCATE) failed: {}, retrying with FULL", e),
    }

    let report = wal_checkpoint(pool, "FULL").await.map_err(|e| {
        log::error!("Checkpoint (FULL) fallback failed: {}", e);
        CheckpointError::DatabaseError(e)
    })?;

    if report.busy != 0 {
        return Err(CheckpointError::Busy);
    }

    log::info!(
        "Database checkpoint (FULL) successful after TRUNCATE failed: {}/{} frames",
        report.checkpointed,
        report.log
    );
    Ok(report)
}

/// Single-connection in-memory pool with the real schema applied
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();

    run_migrations(&pool).await.unwrap();
    pool
}
