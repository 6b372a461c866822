use shared::{UpsertWriteOffRequest, WriteOff};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

use crate::db::{self, generate_id};
use crate::models::WriteOffRow;
use crate::services::members::member_exists;

#[derive(Debug, Error)]
pub enum WriteOffError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Member not found")]
    MemberNotFound,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

fn validate_writeoff_request(request: &UpsertWriteOffRequest) -> Result<(), WriteOffError> {
    if request.member_id.trim().is_empty() {
        return Err(WriteOffError::Validation("memberId is required".to_string()));
    }
    if request.period_end_date < request.period_start_date {
        return Err(WriteOffError::Validation(
            "Write-off period cannot end before it starts".to_string(),
        ));
    }
    if !request.amount.is_finite() || request.amount < 0.0 {
        return Err(WriteOffError::Validation(
            "Write-off amount must be a non-negative amount".to_string(),
        ));
    }
    Ok(())
}

/// All write-offs, most recently recorded first
pub async fn list_writeoffs(conn: &mut SqliteConnection) -> Result<Vec<WriteOff>, sqlx::Error> {
    let rows: Vec<WriteOffRow> = sqlx::query_as("SELECT * FROM writeoffs ORDER BY date DESC, id")
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.iter().map(WriteOffRow::to_shared).collect())
}

pub async fn upsert_writeoff(
    pool: &SqlitePool,
    request: &UpsertWriteOffRequest,
) -> Result<WriteOff, WriteOffError> {
    validate_writeoff_request(request)?;

    let mut tx = db::begin_write(pool).await?;

    if !member_exists(&mut tx, &request.member_id).await? {
        return Err(WriteOffError::MemberNotFound);
    }

    let id = request
        .id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(generate_id);

    sqlx::query(
        r#"
        INSERT INTO writeoffs (id, member_id, period_start_date, period_end_date, amount, date, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            member_id = excluded.member_id, period_start_date = excluded.period_start_date,
            period_end_date = excluded.period_end_date, amount = excluded.amount,
            date = excluded.date, notes = excluded.notes
        "#,
    )
    .bind(&id)
    .bind(&request.member_id)
    .bind(request.period_start_date)
    .bind(request.period_end_date)
    .bind(request.amount)
    .bind(request.date)
    .bind(&request.notes)
    .execute(&mut *tx)
    .await?;

    let row: WriteOffRow = sqlx::query_as("SELECT * FROM writeoffs WHERE id = ?")
        .bind(&id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    log::info!("Upserted write-off {} for member {}", row.id, row.member_id);
    Ok(row.to_shared())
}

pub async fn delete_writeoff(pool: &SqlitePool, writeoff_id: &str) -> Result<bool, WriteOffError> {
    let result = sqlx::query("DELETE FROM writeoffs WHERE id = ?")
        .bind(writeoff_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
