use chrono::{Duration, NaiveDate, Utc};
use shared::{NewHistoryEntry, UpsertMemberRequest, UpsertPaymentRequest};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db;
use crate::services::members::{self, MemberError};
use crate::services::payments::{self, PaymentError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Member error: {0}")]
    MemberError(#[from] MemberError),
    #[error("Payment error: {0}")]
    PaymentError(#[from] PaymentError),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

fn entry<T>(value: T, effective_date: NaiveDate) -> NewHistoryEntry<T> {
    NewHistoryEntry {
        id: None,
        value,
        effective_date,
    }
}

fn sample_members(today: NaiveDate) -> Vec<UpsertMemberRequest> {
    let d1 = today - Duration::days(90);
    let d2 = today - Duration::days(60);
    let d3 = today - Duration::days(30);

    vec![
        UpsertMemberRequest {
            id: None,
            name: "Aisha Khan".to_string(),
            gender: Some("Female".to_string()),
            mobile: Some("03001234567".to_string()),
            email: Some("aisha.k@example.com".to_string()),
            cnic: Some("35202-1234567-1".to_string()),
            admission_fee: Some(2000.0),
            join_date: d1,
            status_history: Some(vec![entry("Active".to_string(), d1)]),
            monthly_fee_history: Some(vec![entry(5000.0, d1)]),
            payment_cycle_day_history: Some(vec![entry(15, d1)]),
        },
        UpsertMemberRequest {
            id: None,
            name: "Bilal Ahmed".to_string(),
            gender: Some("Male".to_string()),
            mobile: Some("03219876543".to_string()),
            email: Some("bilal.ahmed@email.com".to_string()),
            cnic: Some("35201-7654321-2".to_string()),
            admission_fee: Some(1500.0),
            join_date: d2,
            status_history: Some(vec![
                entry("Active".to_string(), d2),
                entry("Inactive".to_string(), d3),
            ]),
            monthly_fee_history: Some(vec![entry(4500.0, d2)]),
            payment_cycle_day_history: Some(vec![entry(10, d2)]),
        },
    ]
}

/// Populate an empty database with two demo members and their opening
/// payments. Returns false when members already exist.
pub async fn seed_sample_data(pool: &SqlitePool) -> Result<bool, SeedError> {
    let mut tx = db::begin_write(pool).await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
        .fetch_one(&mut *tx)
        .await?;
    if count > 0 {
        log::info!("Database already contains data, skipping sample data");
        return Ok(false);
    }

    let today = Utc::now().date_naive();
    for (index, request) in sample_members(today).iter().enumerate() {
        let member = members::upsert_member_in(&mut tx, request).await?;

        if let Some(fee) = member.admission_fee.filter(|fee| *fee > 0.0) {
            payments::upsert_payment_in(
                &mut tx,
                &UpsertPaymentRequest {
                    id: None,
                    member_id: member.id.clone(),
                    date: member.join_date,
                    applied_to_period_start_date: Some(member.join_date),
                    payment_type: "Admission Fee".to_string(),
                    amount: fee,
                },
            )
            .await?;
        }

        // First month paid up front for the first sample member only
        if index == 0 {
            if let Some(fee) = member.monthly_fee_at(member.join_date) {
                payments::upsert_payment_in(
                    &mut tx,
                    &UpsertPaymentRequest {
                        id: None,
                        member_id: member.id.clone(),
                        date: member.join_date,
                        applied_to_period_start_date: Some(member.join_date),
                        payment_type: "Monthly Fee".to_string(),
                        amount: fee,
                    },
                )
                .await?;
            }
        }
    }

    tx.commit().await?;

    log::info!("Sample data populated");
    Ok(true)
}
