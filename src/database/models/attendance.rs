use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub attendance_time: DateTime<Utc>,
    pub attendance_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeRecord {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub hours: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReimbursementRecord {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub amount: f64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttendanceInput {
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOvertimeInput {
    pub hours: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReimbursementInput {
    pub amount: f64,
    pub description: String,
}

/// Per-employee attendance day count over a period.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceCount {
    pub employee_id: Uuid,
    pub days: i64,
}

/// Per-employee overtime hour sum over a period.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OvertimeSum {
    pub employee_id: Uuid,
    pub hours: i64,
}
