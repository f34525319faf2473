use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::database::models::{
    AttendanceCount, AttendanceRecord, OvertimeRecord, OvertimeSum, ReimbursementRecord,
};

pub async fn insert_attendance(
    pool: &SqlitePool,
    employee_id: Uuid,
    timestamp: DateTime<Utc>,
) -> Result<AttendanceRecord, sqlx::Error> {
    let record = AttendanceRecord {
        id: Uuid::new_v4(),
        employee_id,
        attendance_time: timestamp,
        attendance_date: timestamp.date_naive(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO attendances
            (id, employee_id, attendance_time, attendance_date, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id)
    .bind(record.employee_id)
    .bind(record.attendance_time)
    .bind(record.attendance_date)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(record)
}

pub async fn insert_overtime(
    pool: &SqlitePool,
    employee_id: Uuid,
    date: NaiveDate,
    hours: i64,
) -> Result<OvertimeRecord, sqlx::Error> {
    let record = OvertimeRecord {
        id: Uuid::new_v4(),
        employee_id,
        date,
        hours,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO overtimes (id, employee_id, date, hours, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id)
    .bind(record.employee_id)
    .bind(record.date)
    .bind(record.hours)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(record)
}

/// Overtime hours already on record for (employee, date), soft-deleted rows
/// excluded. Used by the daily-cap check.
pub async fn overtime_hours_for_day(
    pool: &SqlitePool,
    employee_id: Uuid,
    date: NaiveDate,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(hours), 0)
        FROM overtimes
        WHERE employee_id = ? AND date = ? AND deleted_at IS NULL
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .fetch_one(pool)
    .await
}

pub async fn insert_reimbursement(
    pool: &SqlitePool,
    employee_id: Uuid,
    amount: f64,
    description: &str,
) -> Result<ReimbursementRecord, sqlx::Error> {
    let record = ReimbursementRecord {
        id: Uuid::new_v4(),
        employee_id,
        amount,
        description: description.to_string(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO reimbursements (id, employee_id, amount, description, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id)
    .bind(record.employee_id)
    .bind(record.amount)
    .bind(&record.description)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(record)
}

/// Distinct attendance days per employee over the inclusive date range.
pub async fn attendance_counts_by_period<'e, E>(
    executor: E,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<AttendanceCount>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, AttendanceCount>(
        r#"
        SELECT employee_id, COUNT(DISTINCT attendance_date) AS days
        FROM attendances
        WHERE attendance_date BETWEEN ? AND ? AND deleted_at IS NULL
        GROUP BY employee_id
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(executor)
    .await
}

/// Summed overtime hours per employee over the inclusive date range.
pub async fn overtime_sums_by_period<'e, E>(
    executor: E,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<OvertimeSum>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, OvertimeSum>(
        r#"
        SELECT employee_id, SUM(hours) AS hours
        FROM overtimes
        WHERE date BETWEEN ? AND ? AND deleted_at IS NULL
        GROUP BY employee_id
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(executor)
    .await
}

/// Individual reimbursement entries submitted within the date range.
pub async fn reimbursements_by_period<'e, E>(
    executor: E,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ReimbursementRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ReimbursementRecord>(
        r#"
        SELECT id, employee_id, amount, description, created_at
        FROM reimbursements
        WHERE date(created_at) BETWEEN ? AND ? AND deleted_at IS NULL
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(executor)
    .await
}
