use shared::{AllData, HistoryType};
use sqlx::SqlitePool;

use crate::models::{MemberHistories, MemberRow};
use crate::services::{history, payments, writeoffs};

/// Read every member, payment and write-off in one transaction.
///
/// Members come back by name, payments and write-offs newest first, and each
/// member carries its three history streams in `(effective_date, id)` order.
pub async fn get_all_data(pool: &SqlitePool) -> Result<AllData, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let member_rows: Vec<MemberRow> = sqlx::query_as("SELECT * FROM members ORDER BY name, id")
        .fetch_all(&mut *tx)
        .await?;
    let payments = payments::list_payments(&mut tx).await?;
    let writeoffs = writeoffs::list_writeoffs(&mut tx).await?;

    let mut statuses = history::load_grouped::<String>(&mut tx, HistoryType::Status).await?;
    let mut fees = history::load_grouped::<f64>(&mut tx, HistoryType::MonthlyFee).await?;
    let mut cycle_days =
        history::load_grouped::<i64>(&mut tx, HistoryType::PaymentCycleDay).await?;

    tx.commit().await?;

    let members = member_rows
        .iter()
        .map(|row| {
            row.to_shared(MemberHistories {
                status: statuses.remove(&row.id).unwrap_or_default(),
                monthly_fee: fees.remove(&row.id).unwrap_or_default(),
                payment_cycle_day: cycle_days.remove(&row.id).unwrap_or_default(),
            })
        })
        .collect();

    Ok(AllData {
        members,
        payments,
        writeoffs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::services::members::upsert_member;
    use crate::services::payments::upsert_payment;
    use chrono::NaiveDate;
    use shared::{NewHistoryEntry, UpsertMemberRequest, UpsertPaymentRequest};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry<T>(id: &str, value: T, effective_date: NaiveDate) -> NewHistoryEntry<T> {
        NewHistoryEntry {
            id: Some(id.to_string()),
            value,
            effective_date,
        }
    }

    fn member_request(id: &str, name: &str) -> UpsertMemberRequest {
        UpsertMemberRequest {
            id: Some(id.to_string()),
            name: name.to_string(),
            join_date: date(2024, 1, 1),
            status_history: Some(vec![entry(
                &format!("{}s", id),
                "Active".to_string(),
                date(2024, 1, 1),
            )]),
            monthly_fee_history: Some(vec![entry(&format!("{}f", id), 5000.0, date(2024, 1, 1))]),
            payment_cycle_day_history: Some(vec![entry(&format!("{}c", id), 1, date(2024, 1, 1))]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_empty_snapshot() {
        let pool = test_pool().await;

        let data = get_all_data(&pool).await.unwrap();

        assert!(data.members.is_empty());
        assert!(data.payments.is_empty());
        assert!(data.writeoffs.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_orders_and_attaches_history() {
        let pool = test_pool().await;
        upsert_member(&pool, &member_request("_zara", "Zara")).await.unwrap();

        let mut bilal = member_request("_bilal", "Bilal");
        bilal.status_history = Some(vec![
            entry("_b2", "Inactive".to_string(), date(2024, 3, 1)),
            entry("_b3", "Active".to_string(), date(2024, 3, 1)),
            entry("_b1", "Active".to_string(), date(2024, 1, 1)),
        ]);
        upsert_member(&pool, &bilal).await.unwrap();

        for (day, member_id) in [(5, "_zara"), (25, "_bilal"), (15, "_zara")] {
            upsert_payment(
                &pool,
                &UpsertPaymentRequest {
                    id: None,
                    member_id: member_id.to_string(),
                    date: date(2024, 2, day),
                    applied_to_period_start_date: None,
                    payment_type: "Monthly Fee".to_string(),
                    amount: 5000.0,
                },
            )
            .await
            .unwrap();
        }

        let data = get_all_data(&pool).await.unwrap();

        let names: Vec<&str> = data.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Bilal", "Zara"]);

        let status_ids: Vec<&str> = data.members[0]
            .status_history
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(status_ids, vec!["_b1", "_b2", "_b3"]);
        assert_eq!(data.members[1].status_history.len(), 1);
        assert_eq!(data.members[1].monthly_fee_history.len(), 1);
        assert_eq!(data.members[1].payment_cycle_day_history.len(), 1);

        let payment_days: Vec<NaiveDate> = data.payments.iter().map(|p| p.date).collect();
        assert_eq!(
            payment_days,
            vec![date(2024, 2, 25), date(2024, 2, 15), date(2024, 2, 5)]
        );
    }
}
