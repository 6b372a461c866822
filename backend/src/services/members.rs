use std::collections::HashSet;

use chrono::NaiveDate;
use shared::{HistoryType, Member, NewHistoryEntry, UpsertMemberRequest};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

use crate::db::{self, generate_id};
use crate::models::MemberRow;
use crate::services::history;

#[derive(Debug, Error)]
pub enum MemberError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Member not found")]
    NotFound,
    #[error("History entry not found")]
    HistoryEntryNotFound,
    #[error("Cannot delete the only {0} entry of this member")]
    OnlyEntry(HistoryType),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// A unique-key clash on a submitted history id is the caller's mistake
fn map_conflict(e: sqlx::Error) -> MemberError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            MemberError::Validation("History entry id is already in use".to_string())
        }
        _ => MemberError::DatabaseError(e),
    }
}

fn validate_stream<T>(
    history_type: HistoryType,
    entries: &[NewHistoryEntry<T>],
    check_value: impl Fn(&T) -> Result<(), String>,
) -> Result<(), MemberError> {
    if entries.is_empty() {
        return Err(MemberError::Validation(format!(
            "{} must contain at least one entry",
            history_type
        )));
    }

    let mut seen = HashSet::new();
    for entry in entries {
        if let Some(id) = entry.id.as_deref().filter(|id| !id.trim().is_empty()) {
            if !seen.insert(id) {
                return Err(MemberError::Validation(format!(
                    "{} contains duplicate entry id {}",
                    history_type, id
                )));
            }
        }
        check_value(&entry.value)
            .map_err(|msg| MemberError::Validation(format!("{}: {}", history_type, msg)))?;
    }

    Ok(())
}

/// Reject a payload before anything is written
pub fn validate_member_request(request: &UpsertMemberRequest) -> Result<(), MemberError> {
    if request.name.trim().is_empty() {
        return Err(MemberError::Validation("Member name is required".to_string()));
    }

    if let Some(fee) = request.admission_fee {
        if !fee.is_finite() || fee < 0.0 {
            return Err(MemberError::Validation(
                "Admission fee must be a non-negative amount".to_string(),
            ));
        }
    }

    if let Some(entries) = &request.status_history {
        validate_stream(HistoryType::Status, entries, |value: &String| {
            if value.trim().is_empty() {
                Err("status must not be empty".to_string())
            } else {
                Ok(())
            }
        })?;
    }

    if let Some(entries) = &request.monthly_fee_history {
        validate_stream(HistoryType::MonthlyFee, entries, |value: &f64| {
            if value.is_finite() && *value >= 0.0 {
                Ok(())
            } else {
                Err("monthly fee must be a non-negative amount".to_string())
            }
        })?;
    }

    if let Some(entries) = &request.payment_cycle_day_history {
        validate_stream(HistoryType::PaymentCycleDay, entries, |value: &i64| {
            if (1..=31).contains(value) {
                Ok(())
            } else {
                Err("payment cycle day must be between 1 and 31".to_string())
            }
        })?;
    }

    Ok(())
}

pub async fn member_exists(conn: &mut SqliteConnection, member_id: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE id = ?")
        .bind(member_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

/// Load a member with all three streams sorted by `(effective_date, id)`
pub async fn load_member(
    conn: &mut SqliteConnection,
    member_id: &str,
) -> Result<Option<Member>, sqlx::Error> {
    let row: Option<MemberRow> = sqlx::query_as("SELECT * FROM members WHERE id = ?")
        .bind(member_id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => {
            let histories = history::load_histories(conn, member_id).await?;
            Ok(Some(row.to_shared(histories)))
        }
        None => Ok(None),
    }
}

pub async fn get_member(pool: &SqlitePool, member_id: &str) -> Result<Option<Member>, MemberError> {
    let mut conn = pool.acquire().await?;
    Ok(load_member(&mut conn, member_id).await?)
}

/// Create or replace a member on an open transaction.
///
/// Streams present in the request replace the stored stream; absent streams
/// stay as they are. A new member needs all three streams.
pub async fn upsert_member_in(
    conn: &mut SqliteConnection,
    request: &UpsertMemberRequest,
) -> Result<Member, MemberError> {
    validate_member_request(request)?;

    let member_id = request
        .id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(generate_id);

    if !member_exists(conn, &member_id).await? {
        for (history_type, present) in [
            (HistoryType::Status, request.status_history.is_some()),
            (HistoryType::MonthlyFee, request.monthly_fee_history.is_some()),
            (
                HistoryType::PaymentCycleDay,
                request.payment_cycle_day_history.is_some(),
            ),
        ] {
            if !present {
                return Err(MemberError::Validation(format!(
                    "{} is required when creating a member",
                    history_type
                )));
            }
        }
    }

    sqlx::query(
        r#"
        INSERT INTO members (id, name, gender, mobile, email, cnic, admission_fee, join_date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name, gender = excluded.gender, mobile = excluded.mobile,
            email = excluded.email, cnic = excluded.cnic,
            admission_fee = excluded.admission_fee, join_date = excluded.join_date
        "#,
    )
    .bind(&member_id)
    .bind(request.name.trim())
    .bind(&request.gender)
    .bind(&request.mobile)
    .bind(&request.email)
    .bind(&request.cnic)
    .bind(request.admission_fee)
    .bind(request.join_date)
    .execute(&mut *conn)
    .await?;

    if let Some(entries) = &request.status_history {
        history::replace_stream(conn, HistoryType::Status, &member_id, entries)
            .await
            .map_err(map_conflict)?;
    }
    if let Some(entries) = &request.monthly_fee_history {
        history::replace_stream(conn, HistoryType::MonthlyFee, &member_id, entries)
            .await
            .map_err(map_conflict)?;
    }
    if let Some(entries) = &request.payment_cycle_day_history {
        history::replace_stream(conn, HistoryType::PaymentCycleDay, &member_id, entries)
            .await
            .map_err(map_conflict)?;
    }

    load_member(conn, &member_id)
        .await?
        .ok_or(MemberError::NotFound)
}

pub async fn upsert_member(
    pool: &SqlitePool,
    request: &UpsertMemberRequest,
) -> Result<Member, MemberError> {
    let mut tx = db::begin_write(pool).await?;
    let member = upsert_member_in(&mut tx, request).await?;
    tx.commit().await?;

    log::info!("Upserted member {} ({})", member.id, member.name);
    Ok(member)
}

/// Delete a member together with its history, payments and write-offs.
/// Returns false when there was nothing to delete.
pub async fn delete_member(pool: &SqlitePool, member_id: &str) -> Result<bool, MemberError> {
    let result = sqlx::query("DELETE FROM members WHERE id = ?")
        .bind(member_id)
        .execute(pool)
        .await?;

    let deleted = result.rows_affected() > 0;
    if deleted {
        log::info!("Deleted member {}", member_id);
    }
    Ok(deleted)
}

/// Move a single history entry to a new effective date
pub async fn update_history_entry(
    pool: &SqlitePool,
    member_id: &str,
    entry_id: &str,
    history_type: HistoryType,
    new_effective_date: NaiveDate,
) -> Result<Member, MemberError> {
    let mut tx = db::begin_write(pool).await?;

    let updated =
        history::set_effective_date(&mut tx, history_type, member_id, entry_id, new_effective_date)
            .await?;
    if !updated {
        log::debug!(
            "No history entry updated: member_id={}, entry_id={}, history_type={}",
            member_id,
            entry_id,
            history_type
        );
        return Err(MemberError::HistoryEntryNotFound);
    }

    let member = load_member(&mut tx, member_id)
        .await?
        .ok_or(MemberError::NotFound)?;
    tx.commit().await?;

    Ok(member)
}

/// Delete a single history entry, refusing to empty the stream
pub async fn delete_history_entry(
    pool: &SqlitePool,
    member_id: &str,
    entry_id: &str,
    history_type: HistoryType,
) -> Result<Member, MemberError> {
    let mut tx = db::begin_write(pool).await?;

    let count = history::count_entries(&mut tx, history_type, member_id).await?;
    if count == 0 {
        return Err(MemberError::NotFound);
    }
    if count <= 1 {
        return Err(MemberError::OnlyEntry(history_type));
    }

    let deleted = history::delete_entry(&mut tx, history_type, member_id, entry_id).await?;
    if !deleted {
        log::debug!(
            "No history entry deleted: member_id={}, entry_id={}, history_type={}",
            member_id,
            entry_id,
            history_type
        );
        return Err(MemberError::HistoryEntryNotFound);
    }

    let member = load_member(&mut tx, member_id)
        .await?
        .ok_or(MemberError::NotFound)?;
    tx.commit().await?;

    Ok(member)
}
