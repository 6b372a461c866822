use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDateTime};
use shared::BackupResult;
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::time;

use crate::config::{BackupTime, Config};
use crate::db::{self, CheckpointError};

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Backup directory is not configured")]
    NotConfigured,
    #[error("No database file behind {0}")]
    NoDatabaseFile(String),
    #[error("Checkpoint failed: {0}")]
    CheckpointError(#[from] CheckpointError),
    #[error("Snapshot failed: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Configuration for the daily backup job
#[derive(Debug, Clone)]
pub struct BackupJobConfig {
    pub database_url: String,
    pub backup_dir: PathBuf,
    pub time: BackupTime,
}

/// File behind a `sqlite:` URL, or None for in-memory databases
pub fn database_file_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or("");

    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

pub fn backup_file_name(now: NaiveDateTime) -> String {
    format!("gym_data_{}.sqlite", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Checkpoint the database, then snapshot it into `backup_dir` with
/// `VACUUM INTO`. The file is never copied directly while the pool is live.
pub async fn run_backup(
    pool: &SqlitePool,
    database_url: &str,
    backup_dir: &Path,
) -> Result<BackupResult, BackupError> {
    let source = database_file_path(database_url)
        .ok_or_else(|| BackupError::NoDatabaseFile(database_url.to_string()))?;

    log::info!("Starting database backup");
    db::checkpoint(pool).await?;

    tokio::fs::create_dir_all(backup_dir).await?;
    let file_name = backup_file_name(Local::now().naive_local());
    let target = backup_dir.join(&file_name);

    sqlx::query("VACUUM INTO ?")
        .bind(target.to_string_lossy().into_owned())
        .execute(pool)
        .await?;
    let size_bytes = tokio::fs::metadata(&target).await?.len();

    log::info!(
        "Backed up {} to {} ({} bytes)",
        source.display(),
        target.display(),
        size_bytes
    );

    Ok(BackupResult {
        file_name,
        path: target.display().to_string(),
        size_bytes,
    })
}

/// Back up into the configured directory, if there is one
pub async fn backup_now(pool: &SqlitePool, config: &Config) -> Result<BackupResult, BackupError> {
    let backup_dir = config
        .backup_dir
        .as_deref()
        .ok_or(BackupError::NotConfigured)?;

    run_backup(pool, &config.database_url, Path::new(backup_dir)).await
}

/// First occurrence of `time` of day strictly after `now`
pub fn next_run_at(now: NaiveDateTime, time: BackupTime) -> NaiveDateTime {
    let today_run = now
        .date()
        .and_hms_opt(time.hour, time.minute, 0)
        .unwrap_or(now);

    if now < today_run {
        today_run
    } else {
        today_run + Duration::days(1)
    }
}

/// Time left until the next `time` of day strictly after `now`
pub fn until_next_run(now: NaiveDateTime, time: BackupTime) -> std::time::Duration {
    (next_run_at(now, time) - now)
        .to_std()
        .unwrap_or(std::time::Duration::from_secs(3600))
}

/// Run a backup every day at the configured local time.
/// A failed run is logged and not retried before the next day.
pub async fn start_scheduler(pool: SqlitePool, config: BackupJobConfig) {
    log::info!(
        "Backup scheduler started. Daily backup scheduled for {} into {}",
        config.time,
        config.backup_dir.display()
    );

    loop {
        let sleep_duration = until_next_run(Local::now().naive_local(), config.time);
        log::debug!(
            "Next backup scheduled in {} seconds",
            sleep_duration.as_secs()
        );

        time::sleep(sleep_duration).await;

        match run_backup(&pool, &config.database_url, &config.backup_dir).await {
            Ok(result) => log::info!("Scheduled backup complete: {}", result.file_name),
            Err(e) => log::error!("Scheduled backup failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_database_file_path() {
        assert_eq!(
            database_file_path("sqlite:gym_data.sqlite?mode=rwc"),
            Some(PathBuf::from("gym_data.sqlite"))
        );
        assert_eq!(
            database_file_path("sqlite:///var/lib/gym/data.sqlite"),
            Some(PathBuf::from("/var/lib/gym/data.sqlite"))
        );
        assert_eq!(database_file_path("sqlite::memory:"), None);
        assert_eq!(database_file_path("postgres://localhost/gym"), None);
    }

    #[test]
    fn test_backup_file_name() {
        assert_eq!(
            backup_file_name(at(9, 5, 7)),
            "gym_data_2024-06-01_09-05-07.sqlite"
        );
    }

    #[test]
    fn test_next_run_at() {
        let time = BackupTime { hour: 2, minute: 30 };
        assert_eq!(next_run_at(at(1, 0, 0), time), at(2, 30, 0));
        assert_eq!(
            next_run_at(at(2, 30, 0), time),
            NaiveDate::from_ymd_opt(2024, 6, 2)
                .unwrap()
                .and_hms_opt(2, 30, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_until_next_run_later_today() {
        let time = BackupTime { hour: 14, minute: 30 };
        assert_eq!(
            until_next_run(at(14, 0, 0), time),
            std::time::Duration::from_secs(30 * 60)
        );
    }

    #[test]
    fn test_until_next_run_tomorrow() {
        let time = BackupTime { hour: 2, minute: 0 };
        assert_eq!(
            until_next_run(at(2, 0, 0), time),
            std::time::Duration::from_secs(24 * 3600)
        );
        assert_eq!(
            until_next_run(at(23, 0, 0), time),
            std::time::Duration::from_secs(3 * 3600)
        );
    }

    #[tokio::test]
    async fn test_run_backup_copies_committed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("gym.sqlite").display());
        let pool = db::connect(&url).await.unwrap();
        db::run_migrations(&pool).await.unwrap();

        sqlx::query("INSERT INTO members (id, name, join_date) VALUES (?, ?, ?)")
            .bind("_member001")
            .bind("Aisha Khan")
            .bind(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .execute(&pool)
            .await
            .unwrap();

        let backup_dir = dir.path().join("backups");
        let result = run_backup(&pool, &url, &backup_dir).await.unwrap();

        assert!(result.file_name.starts_with("gym_data_"));
        assert!(result.size_bytes > 0);

        let copy = db::connect(&format!("sqlite:{}", result.path)).await.unwrap();
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM members")
            .fetch_all(&copy)
            .await
            .unwrap();
        assert_eq!(names, vec!["Aisha Khan".to_string()]);
    }

    #[tokio::test]
    async fn test_backup_is_a_standalone_consistent_file() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("gym.sqlite").display());
        let pool = db::connect(&url).await.unwrap();
        db::run_migrations(&pool).await.unwrap();

        for i in 0..20 {
            sqlx::query("INSERT INTO members (id, name, join_date) VALUES (?, ?, ?)")
                .bind(format!("_member{:03}", i))
                .bind(format!("Member {}", i))
                .bind(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
                .execute(&pool)
                .await
                .unwrap();
        }

        let backup_dir = dir.path().join("backups");
        let result = run_backup(&pool, &url, &backup_dir).await.unwrap();

        let wal = PathBuf::from(format!("{}-wal", result.path));
        assert!(!wal.exists());
        assert_eq!(
            std::fs::metadata(&result.path).unwrap().len(),
            result.size_bytes
        );

        let copy = db::connect(&format!("sqlite:{}", result.path)).await.unwrap();
        let integrity: String = sqlx::query_scalar("PRAGMA integrity_check")
            .fetch_one(&copy)
            .await
            .unwrap();
        assert_eq!(integrity, "ok");
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&copy)
            .await
            .unwrap();
        assert_eq!(count, 20);
    }

    #[tokio::test]
    async fn test_run_backup_rejects_memory_database() {
        let pool = crate::db::test_pool().await;
        let dir = tempfile::tempdir().unwrap();

        let err = run_backup(&pool, "sqlite::memory:", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, BackupError::NoDatabaseFile(_)));
    }
}
