use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::database::models::{Payslip, PayslipSummaryLine, ReimbursementEntry};

#[derive(sqlx::FromRow)]
struct PayslipRow {
    id: Uuid,
    employee_id: Uuid,
    payroll_period_id: Uuid,
    base_salary: f64,
    attendance_days: i64,
    total_working_days: i64,
    overtime_hours: i64,
    overtime_pay: f64,
    reimbursements: String,
    total_reimbursement: f64,
    take_home_pay: f64,
    created_at: DateTime<Utc>,
}

impl TryFrom<PayslipRow> for Payslip {
    type Error = sqlx::Error;

    fn try_from(row: PayslipRow) -> Result<Self, Self::Error> {
        let reimbursements: Vec<ReimbursementEntry> =
            serde_json::from_str(&row.reimbursements).map_err(|e| sqlx::Error::Decode(e.into()))?;

        Ok(Payslip {
            id: row.id,
            employee_id: row.employee_id,
            payroll_period_id: row.payroll_period_id,
            base_salary: row.base_salary,
            attendance_days: row.attendance_days,
            total_working_days: row.total_working_days,
            overtime_hours: row.overtime_hours,
            overtime_pay: row.overtime_pay,
            reimbursements,
            total_reimbursement: row.total_reimbursement,
            take_home_pay: row.take_home_pay,
            created_at: row.created_at,
        })
    }
}

/// Insert one payslip on the payroll run's transaction. The reimbursement
/// list is stored as a JSON column, as the summary endpoints never filter on
/// individual entries.
pub async fn insert_payslip(
    tx: &mut Transaction<'_, Sqlite>,
    payslip: &Payslip,
) -> Result<(), sqlx::Error> {
    let reimbursements = serde_json::to_string(&payslip.reimbursements)
        .map_err(|e| sqlx::Error::Encode(e.into()))?;

    sqlx::query(
        r#"
        INSERT INTO payslips
            (id, employee_id, payroll_period_id, base_salary, attendance_days,
             total_working_days, overtime_hours, overtime_pay, reimbursements,
             total_reimbursement, take_home_pay, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payslip.id)
    .bind(payslip.employee_id)
    .bind(payslip.payroll_period_id)
    .bind(payslip.base_salary)
    .bind(payslip.attendance_days)
    .bind(payslip.total_working_days)
    .bind(payslip.overtime_hours)
    .bind(payslip.overtime_pay)
    .bind(reimbursements)
    .bind(payslip.total_reimbursement)
    .bind(payslip.take_home_pay)
    .bind(payslip.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn summary_by_period(
    pool: &SqlitePool,
    period_id: Uuid,
) -> Result<Vec<PayslipSummaryLine>, sqlx::Error> {
    sqlx::query_as::<_, PayslipSummaryLine>(
        r#"
        SELECT p.employee_id, u.username, p.take_home_pay
        FROM payslips p
        JOIN users u ON u.id = p.employee_id
        WHERE p.payroll_period_id = ?
        ORDER BY u.username
        "#,
    )
    .bind(period_id)
    .fetch_all(pool)
    .await
}

pub async fn payslip_for_employee(
    pool: &SqlitePool,
    employee_id: Uuid,
    period_id: Uuid,
) -> Result<Option<Payslip>, sqlx::Error> {
    let row = sqlx::query_as::<_, PayslipRow>(
        r#"
        SELECT
            id, employee_id, payroll_period_id, base_salary, attendance_days,
            total_working_days, overtime_hours, overtime_pay, reimbursements,
            total_reimbursement, take_home_pay, created_at
        FROM payslips
        WHERE employee_id = ? AND payroll_period_id = ?
        "#,
    )
    .bind(employee_id)
    .bind(period_id)
    .fetch_optional(pool)
    .await?;

    row.map(Payslip::try_from).transpose()
}
