use std::collections::HashMap;

use chrono::NaiveDate;
use shared::{HistoryEntry, HistoryType, NewHistoryEntry};
use sqlx::SqliteConnection;

use crate::db::generate_id;
use crate::models::{history_table, HistoryRow, HistoryValue, MemberHistories};

/// Load one stream of a member, ordered by `(effective_date, id)`
pub async fn load_stream<T: HistoryValue>(
    conn: &mut SqliteConnection,
    history_type: HistoryType,
    member_id: &str,
) -> Result<Vec<HistoryEntry<T>>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM {} WHERE member_id = ? ORDER BY effective_date, id",
        history_table(history_type)
    );
    let rows: Vec<HistoryRow<T>> = sqlx::query_as(&sql)
        .bind(member_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.iter().map(HistoryRow::to_shared).collect())
}

pub async fn load_histories(
    conn: &mut SqliteConnection,
    member_id: &str,
) -> Result<MemberHistories, sqlx::Error> {
    Ok(MemberHistories {
        status: load_stream(conn, HistoryType::Status, member_id).await?,
        monthly_fee: load_stream(conn, HistoryType::MonthlyFee, member_id).await?,
        payment_cycle_day: load_stream(conn, HistoryType::PaymentCycleDay, member_id).await?,
    })
}

/// Load a whole history table grouped by member, each group in history order
pub async fn load_grouped<T: HistoryValue>(
    conn: &mut SqliteConnection,
    history_type: HistoryType,
) -> Result<HashMap<String, Vec<HistoryEntry<T>>>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM {} ORDER BY effective_date, id",
        history_table(history_type)
    );
    let rows: Vec<HistoryRow<T>> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;

    let mut grouped: HashMap<String, Vec<HistoryEntry<T>>> = HashMap::new();
    for row in &rows {
        grouped
            .entry(row.member_id.clone())
            .or_default()
            .push(row.to_shared());
    }
    Ok(grouped)
}

/// Replace the whole stream of a member with `entries`.
///
/// Must run inside a transaction: the delete and the inserts only make sense
/// together.
pub async fn replace_stream<T: HistoryValue>(
    conn: &mut SqliteConnection,
    history_type: HistoryType,
    member_id: &str,
    entries: &[NewHistoryEntry<T>],
) -> Result<(), sqlx::Error> {
    let table = history_table(history_type);

    sqlx::query(&format!("DELETE FROM {} WHERE member_id = ?", table))
        .bind(member_id)
        .execute(&mut *conn)
        .await?;

    let insert = format!(
        "INSERT INTO {} (id, member_id, value, effective_date) VALUES (?, ?, ?, ?)",
        table
    );
    for entry in entries {
        let id = entry
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(generate_id);

        sqlx::query(&insert)
            .bind(id)
            .bind(member_id)
            .bind(entry.value.clone())
            .bind(entry.effective_date)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

pub async fn count_entries(
    conn: &mut SqliteConnection,
    history_type: HistoryType,
    member_id: &str,
) -> Result<i64, sqlx::Error> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE member_id = ?",
        history_table(history_type)
    );
    sqlx::query_scalar(&sql)
        .bind(member_id)
        .fetch_one(&mut *conn)
        .await
}

/// Move one entry to a new effective date. Returns false when no entry with
/// that id belongs to the member in this stream.
pub async fn set_effective_date(
    conn: &mut SqliteConnection,
    history_type: HistoryType,
    member_id: &str,
    entry_id: &str,
    effective_date: NaiveDate,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET effective_date = ? WHERE id = ? AND member_id = ?",
        history_table(history_type)
    );
    let result = sqlx::query(&sql)
        .bind(effective_date)
        .bind(entry_id)
        .bind(member_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_entry(
    conn: &mut SqliteConnection,
    history_type: HistoryType,
    member_id: &str,
    entry_id: &str,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "DELETE FROM {} WHERE id = ? AND member_id = ?",
        history_table(history_type)
    );
    let result = sqlx::query(&sql)
        .bind(entry_id)
        .bind(member_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}
