use shared::{Payment, UpsertPaymentRequest};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

use crate::db::{self, generate_id};
use crate::models::PaymentRow;
use crate::services::members::member_exists;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Member not found")]
    MemberNotFound,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

fn validate_payment_request(request: &UpsertPaymentRequest) -> Result<(), PaymentError> {
    if request.member_id.trim().is_empty() {
        return Err(PaymentError::Validation("memberId is required".to_string()));
    }
    if request.payment_type.trim().is_empty() {
        return Err(PaymentError::Validation("Payment type is required".to_string()));
    }
    if !request.amount.is_finite() || request.amount < 0.0 {
        return Err(PaymentError::Validation(
            "Payment amount must be a non-negative amount".to_string(),
        ));
    }
    Ok(())
}

/// All payments, newest first
pub async fn list_payments(conn: &mut SqliteConnection) -> Result<Vec<Payment>, sqlx::Error> {
    let rows: Vec<PaymentRow> = sqlx::query_as("SELECT * FROM payments ORDER BY date DESC, id")
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.iter().map(PaymentRow::to_shared).collect())
}

/// Create or replace a payment on an open transaction
pub async fn upsert_payment_in(
    conn: &mut SqliteConnection,
    request: &UpsertPaymentRequest,
) -> Result<Payment, PaymentError> {
    validate_payment_request(request)?;

    if !member_exists(conn, &request.member_id).await? {
        return Err(PaymentError::MemberNotFound);
    }

    let id = request
        .id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(generate_id);

    sqlx::query(
        r#"
        INSERT INTO payments (id, member_id, date, applied_to_period_start_date, payment_type, amount)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            member_id = excluded.member_id, date = excluded.date,
            applied_to_period_start_date = excluded.applied_to_period_start_date,
            payment_type = excluded.payment_type, amount = excluded.amount
        "#,
    )
    .bind(&id)
    .bind(&request.member_id)
    .bind(request.date)
    .bind(request.applied_to_period_start_date)
    .bind(request.payment_type.trim())
    .bind(request.amount)
    .execute(&mut *conn)
    .await?;

    let row: PaymentRow = sqlx::query_as("SELECT * FROM payments WHERE id = ?")
        .bind(&id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(row.to_shared())
}

pub async fn upsert_payment(
    pool: &SqlitePool,
    request: &UpsertPaymentRequest,
) -> Result<Payment, PaymentError> {
    let mut tx = db::begin_write(pool).await?;
    let payment = upsert_payment_in(&mut tx, request).await?;
    tx.commit().await?;

    log::info!(
        "Upserted payment {} for member {}",
        payment.id,
        payment.member_id
    );
    Ok(payment)
}

pub async fn delete_payment(pool: &SqlitePool, payment_id: &str) -> Result<bool, PaymentError> {
    let result = sqlx::query("DELETE FROM payments WHERE id = ?")
        .bind(payment_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn insert_member(pool: &SqlitePool, id: &str) {
        sqlx::query("INSERT INTO members (id, name, join_date) VALUES (?, ?, ?)")
            .bind(id)
            .bind("Test Member")
            .bind(date(2024, 1, 1))
            .execute(pool)
            .await
            .unwrap();
    }

    fn payment_request(member_id: &str) -> UpsertPaymentRequest {
        UpsertPaymentRequest {
            id: None,
            member_id: member_id.to_string(),
            date: date(2024, 2, 15),
            applied_to_period_start_date: Some(date(2024, 2, 15)),
            payment_type: "Monthly Fee".to_string(),
            amount: 5000.0,
        }
    }

    #[test]
    fn test_payment_error_display() {
        assert_eq!(PaymentError::MemberNotFound.to_string(), "Member not found");
        assert_eq!(
            PaymentError::Validation("bad".to_string()).to_string(),
            "Validation failed: bad"
        );
    }

    #[tokio::test]
    async fn test_create_and_replace_payment() {
        let pool = test_pool().await;
        insert_member(&pool, "_member001").await;

        let created = upsert_payment(&pool, &payment_request("_member001")).await.unwrap();
        assert!(created.id.starts_with('_'));
        assert_eq!(created.amount, 5000.0);

        let mut update = payment_request("_member001");
        update.id = Some(created.id.clone());
        update.amount = 4500.0;
        update.applied_to_period_start_date = None;
        let updated = upsert_payment(&pool, &update).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.amount, 4500.0);
        assert!(updated.applied_to_period_start_date.is_none());

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(list_payments(&mut conn).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_payment_for_unknown_member_is_rejected() {
        let pool = test_pool().await;

        let err = upsert_payment(&pool, &payment_request("_nobody000"))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::MemberNotFound));
    }

    #[tokio::test]
    async fn test_payment_validation() {
        let pool = test_pool().await;
        insert_member(&pool, "_member001").await;

        let mut request = payment_request("_member001");
        request.payment_type = "  ".to_string();
        assert!(matches!(
            upsert_payment(&pool, &request).await,
            Err(PaymentError::Validation(_))
        ));

        let mut request = payment_request("_member001");
        request.amount = -10.0;
        assert!(matches!(
            upsert_payment(&pool, &request).await,
            Err(PaymentError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_payments_newest_first() {
        let pool = test_pool().await;
        insert_member(&pool, "_member001").await;

        for (day, amount) in [(1, 100.0), (20, 300.0), (10, 200.0)] {
            let mut request = payment_request("_member001");
            request.date = date(2024, 3, day);
            request.amount = amount;
            upsert_payment(&pool, &request).await.unwrap();
        }

        let mut conn = pool.acquire().await.unwrap();
        let amounts: Vec<f64> = list_payments(&mut conn)
            .await
            .unwrap()
            .iter()
            .map(|p| p.amount)
            .collect();

        assert_eq!(amounts, vec![300.0, 200.0, 100.0]);
    }

    #[tokio::test]
    async fn test_delete_payment() {
        let pool = test_pool().await;
        insert_member(&pool, "_member001").await;
        let payment = upsert_payment(&pool, &payment_request("_member001")).await.unwrap();

        assert!(delete_payment(&pool, &payment.id).await.unwrap());
        assert!(!delete_payment(&pool, &payment.id).await.unwrap());
    }
}
