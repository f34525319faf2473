use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One reimbursement line carried onto a payslip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReimbursementEntry {
    pub id: Uuid,
    pub amount: f64,
    pub description: String,
}

/// The immutable computed result of one employee's pay for one processed
/// period. Uniquely keyed by (employee_id, payroll_period_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payslip {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub payroll_period_id: Uuid,
    pub base_salary: f64,
    pub attendance_days: i64,
    pub total_working_days: i64,
    pub overtime_hours: i64,
    pub overtime_pay: f64,
    pub reimbursements: Vec<ReimbursementEntry>,
    pub total_reimbursement: f64,
    pub take_home_pay: f64,
    pub created_at: DateTime<Utc>,
}

/// One line of the admin-facing summary for a processed period.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PayslipSummaryLine {
    pub employee_id: Uuid,
    pub username: String,
    pub take_home_pay: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayslipSummary {
    pub payroll_period_id: Uuid,
    pub lines: Vec<PayslipSummaryLine>,
    pub total_take_home_pay: f64,
}

/// Per-employee merged facts for a period; transient input to pay
/// calculation. Employees that only appear in a later fact stream keep the
/// zero defaults for the earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayrollCalculationData {
    pub employee_id: Uuid,
    pub payroll_period_id: Uuid,
    pub total_working_days: i64,
    pub attendance_days: i64,
    pub overtime_hours: i64,
    pub reimbursements: Vec<ReimbursementEntry>,
    pub salary: f64,
}
