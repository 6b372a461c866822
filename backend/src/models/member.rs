use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{sort_history, HistoryEntry};
use sqlx::FromRow;

/// Database model for members
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MemberRow {
    pub id: String,
    pub name: String,
    pub gender: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub cnic: Option<String>,
    pub admission_fee: Option<f64>,
    pub join_date: NaiveDate,
}

/// The three history streams of one member, each already sorted
#[derive(Debug, Clone, Default)]
pub struct MemberHistories {
    pub status: Vec<HistoryEntry<String>>,
    pub monthly_fee: Vec<HistoryEntry<f64>>,
    pub payment_cycle_day: Vec<HistoryEntry<i64>>,
}

impl MemberRow {
    /// Streams are put into `(effective_date, id)` order whatever order the
    /// caller loaded them in
    pub fn to_shared(&self, mut histories: MemberHistories) -> shared::Member {
        sort_history(&mut histories.status);
        sort_history(&mut histories.monthly_fee);
        sort_history(&mut histories.payment_cycle_day);

        shared::Member {
            id: self.id.clone(),
            name: self.name.clone(),
            gender: self.gender.clone(),
            mobile: self.mobile.clone(),
            email: self.email.clone(),
            cnic: self.cnic.clone(),
            admission_fee: self.admission_fee,
            join_date: self.join_date,
            status_history: histories.status,
            monthly_fee_history: histories.monthly_fee,
            payment_cycle_day_history: histories.payment_cycle_day,
        }
    }
}
