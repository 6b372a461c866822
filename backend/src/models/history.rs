use chrono::NaiveDate;
use shared::{HistoryEntry, HistoryType};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, Sqlite};

/// Value types that can be stored in a history table
pub trait HistoryValue:
    Clone
    + Send
    + Sync
    + Unpin
    + 'static
    + sqlx::Type<Sqlite>
    + for<'q> sqlx::Encode<'q, Sqlite>
    + for<'r> sqlx::Decode<'r, Sqlite>
{
}

impl HistoryValue for String {}
impl HistoryValue for f64 {}
impl HistoryValue for i64 {}

/// Table backing each history stream
pub fn history_table(history_type: HistoryType) -> &'static str {
    match history_type {
        HistoryType::Status => "member_status_history",
        HistoryType::MonthlyFee => "member_monthly_fee_history",
        HistoryType::PaymentCycleDay => "member_payment_cycle_day_history",
    }
}

/// Database model for one history entry of any stream
#[derive(Debug, Clone)]
pub struct HistoryRow<T> {
    pub id: String,
    pub member_id: String,
    pub value: T,
    pub effective_date: NaiveDate,
}

impl<'r, T: HistoryValue> FromRow<'r, SqliteRow> for HistoryRow<T> {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            member_id: row.try_get("member_id")?,
            value: row.try_get("value")?,
            effective_date: row.try_get("effective_date")?,
        })
    }
}

impl<T: Clone> HistoryRow<T> {
    pub fn to_shared(&self) -> HistoryEntry<T> {
        HistoryEntry {
            id: self.id.clone(),
            value: self.value.clone(),
            effective_date: self.effective_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_history_tables_are_distinct() {
        let tables: HashSet<&str> = HistoryType::ALL.iter().map(|t| history_table(*t)).collect();
        assert_eq!(tables.len(), 3);
        assert_eq!(history_table(HistoryType::Status), "member_status_history");
    }

    #[test]
    fn test_history_row_to_shared() {
        let row = HistoryRow {
            id: "_fee000001".to_string(),
            member_id: "_member001".to_string(),
            value: 4500.0,
            effective_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        };

        let entry = row.to_shared();

        assert_eq!(entry.id, "_fee000001");
        assert_eq!(entry.value, 4500.0);
        assert_eq!(entry.effective_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }
}
