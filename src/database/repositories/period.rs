use sqlx::{Executor, Sqlite, Transaction};
use uuid::Uuid;

use crate::database::models::PayrollPeriod;

/// Deactivate whichever period is currently active and insert the new one as
/// active, in the caller's transaction. Readers never observe zero or two
/// active periods.
pub async fn set_active_period(
    tx: &mut Transaction<'_, Sqlite>,
    period: &PayrollPeriod,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE payroll_periods SET active = 0 WHERE active = 1
        "#,
    )
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO payroll_periods
            (id, start_date, end_date, total_working_days, active, processed, created_at)
        VALUES (?, ?, ?, ?, 1, 0, ?)
        "#,
    )
    .bind(period.id)
    .bind(period.start_date)
    .bind(period.end_date)
    .bind(period.total_working_days)
    .bind(period.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn active_period<'e, E>(executor: E) -> Result<Option<PayrollPeriod>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, PayrollPeriod>(
        r#"
        SELECT
            id, start_date, end_date, total_working_days,
            active, processed, total_salary_paid, created_at
        FROM payroll_periods
        WHERE active = 1
        "#,
    )
    .fetch_optional(executor)
    .await
}

/// Flip the idempotency flag and record the disbursed total, exactly once.
pub async fn mark_processed(
    tx: &mut Transaction<'_, Sqlite>,
    period_id: Uuid,
    total_salary_paid: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE payroll_periods
        SET processed = 1, total_salary_paid = ?
        WHERE id = ?
        "#,
    )
    .bind(total_salary_paid)
    .bind(period_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
