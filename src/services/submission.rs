use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc, Weekday};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    database::{
        models::{AttendanceRecord, OvertimeRecord, ReimbursementRecord},
        repositories::attendance as attendance_repo,
    },
    error::AppError,
    services::keyed_lock::KeyedLock,
};

/// Standard working window on weekdays, [start, end) clock hours.
pub const WORKING_HOURS: (i64, i64) = (9, 17);

/// Daily cumulative overtime cap, in hours.
pub const MAX_DAILY_OVERTIME_HOURS: i64 = 3;

/// Validates and persists employee claims: attendance check-ins, overtime
/// hours, and reimbursement requests. Business rejections surface as
/// `AppError::BadRequest`; persistence failures are logged and surface as
/// `AppError::DatabaseError`.
#[derive(Clone)]
pub struct SubmissionService {
    pool: SqlitePool,
    overtime_locks: KeyedLock<(Uuid, NaiveDate)>,
}

impl SubmissionService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            overtime_locks: KeyedLock::new(),
        }
    }

    /// Record an attendance check-in. Rejected when either the submission
    /// day (`now`) or the claimed timestamp falls on a weekend.
    pub async fn submit_attendance(
        &self,
        employee_id: Uuid,
        now: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AppError> {
        if is_weekend(now.weekday()) || is_weekend(timestamp.weekday()) {
            return Err(AppError::BadRequest(
                "attendance cannot be submitted on a weekend".to_string(),
            ));
        }

        attendance_repo::insert_attendance(&self.pool, employee_id, timestamp)
            .await
            .map_err(|err| {
                log::error!("Failed to store attendance for {}: {}", employee_id, err);
                AppError::DatabaseError(err)
            })
    }

    /// Record overtime hours finishing at `timestamp`. The claimed window
    /// must lie outside weekday working hours, and the day's cumulative
    /// total may not exceed the cap. The cap check runs under a
    /// per-(employee, date) lock so concurrent submissions cannot jointly
    /// slip past it.
    pub async fn submit_overtime(
        &self,
        employee_id: Uuid,
        hours: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<OvertimeRecord, AppError> {
        if hours < 1 {
            return Err(AppError::BadRequest(
                "overtime hours must be at least 1".to_string(),
            ));
        }

        validate_overtime_window(timestamp, hours)?;

        let date = timestamp.date_naive();
        let _guard = self.overtime_locks.acquire((employee_id, date)).await;

        let existing = attendance_repo::overtime_hours_for_day(&self.pool, employee_id, date)
            .await
            .map_err(|err| {
                log::error!("Failed to read overtime hours for {}: {}", employee_id, err);
                AppError::DatabaseError(err)
            })?;

        if existing + hours > MAX_DAILY_OVERTIME_HOURS {
            return Err(AppError::BadRequest(format!(
                "overtime cannot exceed {} hours per day",
                MAX_DAILY_OVERTIME_HOURS
            )));
        }

        attendance_repo::insert_overtime(&self.pool, employee_id, date, hours)
            .await
            .map_err(|err| {
                log::error!("Failed to store overtime for {}: {}", employee_id, err);
                AppError::DatabaseError(err)
            })
    }

    /// Record a reimbursement claim. Structural validation only.
    pub async fn submit_reimbursement(
        &self,
        employee_id: Uuid,
        amount: f64,
        description: &str,
    ) -> Result<ReimbursementRecord, AppError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(AppError::BadRequest(
                "reimbursement amount must be positive".to_string(),
            ));
        }

        if description.trim().is_empty() {
            return Err(AppError::BadRequest(
                "reimbursement description is required".to_string(),
            ));
        }

        attendance_repo::insert_reimbursement(&self.pool, employee_id, amount, description)
            .await
            .map_err(|err| {
                log::error!(
                    "Failed to store reimbursement for {}: {}",
                    employee_id,
                    err
                );
                AppError::DatabaseError(err)
            })
    }
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Overtime window rule for weekday submissions: the finishing timestamp
/// must lie outside 09:00-16:59, and the claimed hours may not reach back
/// into the working window. Hours before 09:00 count as a continuation of
/// the previous day's evening, so 24 is added before comparing against the
/// 17:00 close.
fn validate_overtime_window(timestamp: DateTime<Utc>, hours: i64) -> Result<(), AppError> {
    if is_weekend(timestamp.weekday()) {
        return Ok(());
    }

    let mut hour = i64::from(timestamp.hour());

    if hour >= WORKING_HOURS.0 && hour < WORKING_HOURS.1 {
        return Err(AppError::BadRequest(
            "overtime must be submitted outside working hours".to_string(),
        ));
    }

    if hour < WORKING_HOURS.0 {
        hour += 24;
    }

    if hour - hours < WORKING_HOURS.1 {
        return Err(AppError::BadRequest(
            "overtime hours overlap with working hours".to_string(),
        ));
    }

    Ok(())
}
