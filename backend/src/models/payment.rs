use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for payments
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentRow {
    pub id: String,
    pub member_id: String,
    pub date: NaiveDate,
    pub applied_to_period_start_date: Option<NaiveDate>,
    pub payment_type: String,
    pub amount: f64,
}

impl PaymentRow {
    pub fn to_shared(&self) -> shared::Payment {
        shared::Payment {
            id: self.id.clone(),
            member_id: self.member_id.clone(),
            date: self.date,
            applied_to_period_start_date: self.applied_to_period_start_date,
            payment_type: self.payment_type.clone(),
            amount: self.amount,
        }
    }
}
