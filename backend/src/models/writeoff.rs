use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for write-offs
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WriteOffRow {
    pub id: String,
    pub member_id: String,
    pub period_start_date: NaiveDate,
    pub period_end_date: NaiveDate,
    pub amount: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

impl WriteOffRow {
    pub fn to_shared(&self) -> shared::WriteOff {
        shared::WriteOff {
            id: self.id.clone(),
            member_id: self.member_id.clone(),
            period_start_date: self.period_start_date,
            period_end_date: self.period_end_date,
            amount: self.amount,
            date: self.date,
            notes: self.notes.clone(),
        }
    }
}
