use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An administrator-defined date range over which submitted facts are
/// aggregated for one payroll run. At most one period is active system-wide;
/// a processed period can never be processed again.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PayrollPeriod {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_working_days: i64,
    pub active: bool,
    pub processed: bool,
    pub total_salary_paid: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePeriodInput {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
