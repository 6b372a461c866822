use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// History Types
// ============================================================================

/// The three versioned attributes of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryType {
    #[serde(rename = "statusHistory")]
    Status,
    #[serde(rename = "monthlyFeeHistory")]
    MonthlyFee,
    #[serde(rename = "paymentCycleDayHistory")]
    PaymentCycleDay,
}

impl HistoryType {
    pub const ALL: [HistoryType; 3] = [
        HistoryType::Status,
        HistoryType::MonthlyFee,
        HistoryType::PaymentCycleDay,
    ];

    /// Key used in JSON payloads and in route paths
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryType::Status => "statusHistory",
            HistoryType::MonthlyFee => "monthlyFeeHistory",
            HistoryType::PaymentCycleDay => "paymentCycleDayHistory",
        }
    }
}

impl FromStr for HistoryType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "statusHistory" | "status" => Ok(HistoryType::Status),
            "monthlyFeeHistory" | "monthlyFee" => Ok(HistoryType::MonthlyFee),
            "paymentCycleDayHistory" | "paymentCycleDay" => Ok(HistoryType::PaymentCycleDay),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for HistoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dated value of one member attribute.
///
/// Entries are ordered by `(effective_date, id)`; the id only breaks ties
/// between entries sharing a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry<T> {
    pub id: String,
    pub value: T,
    pub effective_date: NaiveDate,
}

/// History entry as submitted by a client; the id is generated when missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHistoryEntry<T> {
    #[serde(default)]
    pub id: Option<String>,
    pub value: T,
    pub effective_date: NaiveDate,
}

/// Sort entries by `(effective_date, id)` ascending
pub fn sort_history<T>(entries: &mut [HistoryEntry<T>]) {
    entries.sort_by(|a, b| {
        a.effective_date
            .cmp(&b.effective_date)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Value in force on `date`: the last entry (in history order) whose
/// effective date is on or before `date`.
pub fn value_in_effect<T>(entries: &[HistoryEntry<T>], date: NaiveDate) -> Option<&T> {
    entries
        .iter()
        .filter(|e| e.effective_date <= date)
        .max_by(|a, b| {
            a.effective_date
                .cmp(&b.effective_date)
                .then_with(|| a.id.cmp(&b.id))
        })
        .map(|e| &e.value)
}

// ============================================================================
// Member Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub gender: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub cnic: Option<String>,
    pub admission_fee: Option<f64>,
    pub join_date: NaiveDate,
    pub status_history: Vec<HistoryEntry<String>>,
    pub monthly_fee_history: Vec<HistoryEntry<f64>>,
    pub payment_cycle_day_history: Vec<HistoryEntry<i64>>,
}

impl Member {
    pub fn status_at(&self, date: NaiveDate) -> Option<&str> {
        value_in_effect(&self.status_history, date).map(String::as_str)
    }

    pub fn monthly_fee_at(&self, date: NaiveDate) -> Option<f64> {
        value_in_effect(&self.monthly_fee_history, date).copied()
    }

    pub fn payment_cycle_day_at(&self, date: NaiveDate) -> Option<i64> {
        value_in_effect(&self.payment_cycle_day_history, date).copied()
    }
}

/// Create-or-replace payload for a member.
///
/// A history key that is present replaces the whole stream; an absent key
/// leaves the stored stream untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertMemberRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub cnic: Option<String>,
    #[serde(default)]
    pub admission_fee: Option<f64>,
    pub join_date: NaiveDate,
    #[serde(default)]
    pub status_history: Option<Vec<NewHistoryEntry<String>>>,
    #[serde(default)]
    pub monthly_fee_history: Option<Vec<NewHistoryEntry<f64>>>,
    #[serde(default)]
    pub payment_cycle_day_history: Option<Vec<NewHistoryEntry<i64>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHistoryEntryRequest {
    pub new_effective_date: NaiveDate,
}

// ============================================================================
// Payment Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub member_id: String,
    pub date: NaiveDate,
    pub applied_to_period_start_date: Option<NaiveDate>,
    pub payment_type: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertPaymentRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub member_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub applied_to_period_start_date: Option<NaiveDate>,
    pub payment_type: String,
    pub amount: f64,
}

// ============================================================================
// Write-off Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOff {
    pub id: String,
    pub member_id: String,
    pub period_start_date: NaiveDate,
    pub period_end_date: NaiveDate,
    pub amount: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertWriteOffRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub member_id: String,
    pub period_start_date: NaiveDate,
    pub period_end_date: NaiveDate,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

// ============================================================================
// Snapshot Types
// ============================================================================

/// Everything the client needs in one read
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllData {
    pub members: Vec<Member>,
    pub payments: Vec<Payment>,
    pub writeoffs: Vec<WriteOff>,
}

// ============================================================================
// Backup Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupResult {
    pub file_name: String,
    pub path: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupStatus {
    pub is_configured: bool,
    pub backup_dir: Option<String>,
    pub is_scheduled: bool,
    pub time: Option<String>,
    /// Local time of the next scheduled run
    pub next_run: Option<NaiveDateTime>,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry<T>(id: &str, value: T, effective_date: NaiveDate) -> HistoryEntry<T> {
        HistoryEntry {
            id: id.to_string(),
            value,
            effective_date,
        }
    }

    #[test]
    fn test_history_type_from_str() {
        assert_eq!("statusHistory".parse(), Ok(HistoryType::Status));
        assert_eq!("monthlyFeeHistory".parse(), Ok(HistoryType::MonthlyFee));
        assert_eq!(
            "paymentCycleDayHistory".parse(),
            Ok(HistoryType::PaymentCycleDay)
        );
        assert!("feeHistory".parse::<HistoryType>().is_err());
        assert!("".parse::<HistoryType>().is_err());
    }

    #[test]
    fn test_history_type_round_trips_through_as_str() {
        for history_type in HistoryType::ALL {
            assert_eq!(history_type.as_str().parse(), Ok(history_type));
        }
    }

    #[test]
    fn test_sort_history_breaks_ties_by_id() {
        let day = date(2024, 3, 1);
        let mut entries = vec![
            entry("_zzz", "Inactive".to_string(), day),
            entry("_aaa", "Active".to_string(), day),
            entry("_mmm", "Frozen".to_string(), date(2024, 1, 1)),
        ];

        sort_history(&mut entries);

        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["_mmm", "_aaa", "_zzz"]);
    }

    #[test]
    fn test_value_in_effect() {
        let fees = vec![
            entry("_a", 4000.0, date(2024, 1, 1)),
            entry("_b", 5000.0, date(2024, 6, 1)),
        ];

        assert_eq!(value_in_effect(&fees, date(2023, 12, 31)), None);
        assert_eq!(value_in_effect(&fees, date(2024, 1, 1)), Some(&4000.0));
        assert_eq!(value_in_effect(&fees, date(2024, 5, 31)), Some(&4000.0));
        assert_eq!(value_in_effect(&fees, date(2024, 6, 1)), Some(&5000.0));
        assert_eq!(value_in_effect(&fees, date(2030, 1, 1)), Some(&5000.0));
    }

    #[test]
    fn test_value_in_effect_ignores_input_order() {
        let statuses = vec![
            entry("_b", "Inactive".to_string(), date(2024, 6, 1)),
            entry("_a", "Active".to_string(), date(2024, 1, 1)),
        ];

        assert_eq!(
            value_in_effect(&statuses, date(2024, 7, 1)).map(String::as_str),
            Some("Inactive")
        );
    }

    #[test]
    fn test_value_in_effect_same_day_uses_highest_id() {
        let days = vec![
            entry("_b", 20, date(2024, 1, 1)),
            entry("_a", 10, date(2024, 1, 1)),
        ];

        assert_eq!(value_in_effect(&days, date(2024, 1, 1)), Some(&20));
    }

    #[test]
    fn test_member_value_helpers() {
        let member = Member {
            id: "_member001".to_string(),
            name: "Aisha Khan".to_string(),
            gender: Some("Female".to_string()),
            mobile: None,
            email: None,
            cnic: None,
            admission_fee: Some(2000.0),
            join_date: date(2024, 1, 1),
            status_history: vec![
                entry("_s1", "Active".to_string(), date(2024, 1, 1)),
                entry("_s2", "Inactive".to_string(), date(2024, 3, 1)),
            ],
            monthly_fee_history: vec![entry("_f1", 5000.0, date(2024, 1, 1))],
            payment_cycle_day_history: vec![entry("_c1", 15, date(2024, 1, 1))],
        };

        assert_eq!(member.status_at(date(2024, 2, 1)), Some("Active"));
        assert_eq!(member.status_at(date(2024, 3, 1)), Some("Inactive"));
        assert_eq!(member.monthly_fee_at(date(2024, 2, 1)), Some(5000.0));
        assert_eq!(member.payment_cycle_day_at(date(2023, 2, 1)), None);
    }

    #[test]
    fn test_upsert_member_request_optional_streams() {
        let json = r#"{
            "name": "Bilal Ahmed",
            "joinDate": "2024-02-01",
            "statusHistory": [{"value": "Active", "effectiveDate": "2024-02-01"}]
        }"#;

        let request: UpsertMemberRequest = serde_json::from_str(json).unwrap();

        assert!(request.id.is_none());
        assert_eq!(request.status_history.as_ref().map(Vec::len), Some(1));
        assert!(request.status_history.unwrap()[0].id.is_none());
        assert!(request.monthly_fee_history.is_none());
        assert!(request.payment_cycle_day_history.is_none());
    }

    #[test]
    fn test_upsert_member_request_rejects_bad_date() {
        let json = r#"{"name": "X", "joinDate": "01/02/2024"}"#;
        assert!(serde_json::from_str::<UpsertMemberRequest>(json).is_err());
    }

    #[test]
    fn test_member_serializes_camel_case() {
        let member = Member {
            id: "_abc123xyz".to_string(),
            name: "Aisha".to_string(),
            gender: None,
            mobile: None,
            email: None,
            cnic: None,
            admission_fee: None,
            join_date: date(2024, 1, 1),
            status_history: vec![entry("_s1", "Active".to_string(), date(2024, 1, 1))],
            monthly_fee_history: vec![],
            payment_cycle_day_history: vec![],
        };

        let value = serde_json::to_value(&member).unwrap();

        assert_eq!(value["joinDate"], "2024-01-01");
        assert_eq!(value["statusHistory"][0]["effectiveDate"], "2024-01-01");
        assert!(value.get("monthlyFeeHistory").is_some());
        assert!(value.get("paymentCycleDayHistory").is_some());
    }

    #[test]
    fn test_api_success() {
        let success = ApiSuccess::new("test data");
        assert_eq!(success.data, "test data");
    }
}
