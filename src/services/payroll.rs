use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::{
    database::{
        models::{
            AttendanceCount, OvertimeSum, PayrollCalculationData, PayrollPeriod, Payslip,
            PayslipSummary, ReimbursementEntry, ReimbursementRecord, UserSalary,
        },
        repositories::{
            attendance as attendance_repo, payslip as payslip_repo, period as period_repo,
            user as user_repo,
        },
        transaction::DatabaseTransaction,
    },
    error::AppError,
};

/// Working hours per attendance day, used to derive the hourly rate.
const HOURS_PER_WORKING_DAY: f64 = 8.0;

/// Outcome of one completed payroll run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRunResult {
    pub payroll_period_id: Uuid,
    pub payslip_count: usize,
    pub total_salary_paid: f64,
}

/// Period bookkeeping and the payroll run itself: aggregation of submitted
/// facts, concurrent pay calculation, and atomic persistence of the
/// resulting payslips.
#[derive(Clone)]
pub struct PayrollService {
    pool: SqlitePool,
    workers: usize,
}

impl PayrollService {
    pub fn new(pool: SqlitePool, workers: usize) -> Self {
        Self {
            pool,
            workers: workers.max(1),
        }
    }

    /// Create a new payroll period and make it the single active one,
    /// deactivating any predecessor in the same transaction. Admin only.
    pub async fn set_period(
        &self,
        acting_user_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PayrollPeriod, AppError> {
        self.require_admin(acting_user_id).await?;

        if end_date < start_date {
            return Err(AppError::BadRequest(
                "end date is earlier than start date".to_string(),
            ));
        }

        let period = PayrollPeriod {
            id: Uuid::new_v4(),
            start_date,
            end_date,
            total_working_days: count_working_days(start_date, end_date),
            active: true,
            processed: false,
            total_salary_paid: None,
            created_at: Utc::now(),
        };

        let inserted = period.clone();
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                period_repo::set_active_period(tx, &inserted)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await?;

        Ok(period)
    }

    /// The unique active period. Payroll cannot run without one.
    pub async fn active_period(&self) -> Result<PayrollPeriod, AppError> {
        period_repo::active_period(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("no active payroll period".to_string()))
    }

    /// Run payroll for the active period: aggregate every employee's facts,
    /// compute payslips on a bounded worker pool, persist them, and mark the
    /// period processed with the disbursed total. The whole read-compute-
    /// write sequence is one transaction; any failure rolls everything back.
    pub async fn run_payroll(&self, acting_user_id: Uuid) -> Result<PayrollRunResult, AppError> {
        self.require_admin(acting_user_id).await?;

        let workers = self.workers;
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let period = period_repo::active_period(&mut **tx)
                    .await?
                    .ok_or_else(|| AppError::NotFound("no active payroll period".to_string()))?;

                if period.processed {
                    return Err(AppError::Conflict(
                        "payroll already processed for the active period".to_string(),
                    ));
                }

                let jobs = build_calculation_data(tx, &period).await?;

                let (total_salary_paid, payslip_count) =
                    process_payslips(tx, jobs, workers).await?;

                period_repo::mark_processed(tx, period.id, total_salary_paid).await?;

                Ok(PayrollRunResult {
                    payroll_period_id: period.id,
                    payslip_count,
                    total_salary_paid,
                })
            })
        })
        .await
    }

    /// Admin view: every payslip line for the active period plus the grand
    /// total take-home pay.
    pub async fn payslips_summary(&self, acting_user_id: Uuid) -> Result<PayslipSummary, AppError> {
        self.require_admin(acting_user_id).await?;

        let period = self.active_period().await?;
        let lines = payslip_repo::summary_by_period(&self.pool, period.id).await?;
        let total_take_home_pay = lines.iter().map(|line| line.take_home_pay).sum();

        Ok(PayslipSummary {
            payroll_period_id: period.id,
            lines,
            total_take_home_pay,
        })
    }

    /// An employee's own payslip for the active period.
    pub async fn employee_payslip(&self, employee_id: Uuid) -> Result<Payslip, AppError> {
        let period = self.active_period().await?;

        payslip_repo::payslip_for_employee(&self.pool, employee_id, period.id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "no payslip for employee {} in the active period",
                    employee_id
                ))
            })
    }

    async fn require_admin(&self, user_id: Uuid) -> Result<(), AppError> {
        let is_admin = user_repo::is_admin(&self.pool, user_id).await.map_err(|err| {
            log::error!("Failed to check admin role for {}: {}", user_id, err);
            AppError::DatabaseError(err)
        })?;

        if !is_admin {
            return Err(AppError::PermissionDenied("admin only operation".to_string()));
        }

        Ok(())
    }
}

/// Fan out the aggregates to a fixed pool of calculation workers and fan the
/// payslips back into this task, which persists them on the transaction and
/// accumulates the disbursed total.
///
/// Wiring: the producer closing the job channel is the only exit signal for
/// workers, and this task drains results until every worker sender is gone.
/// If a store fails mid-drain, dropping the receiver makes pending worker
/// sends fail instead of blocking, so a partial failure can never deadlock
/// the pool. Worker panics surface through the join below and fail the run.
async fn process_payslips(
    tx: &mut Transaction<'_, Sqlite>,
    jobs: Vec<PayrollCalculationData>,
    workers: usize,
) -> Result<(f64, usize), AppError> {
    let (job_tx, job_rx) = mpsc::channel::<PayrollCalculationData>(workers);
    let (slip_tx, mut slip_rx) = mpsc::channel::<Payslip>(workers);
    let job_rx = Arc::new(Mutex::new(job_rx));

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let job_rx = Arc::clone(&job_rx);
        let slip_tx = slip_tx.clone();

        handles.push(tokio::spawn(async move {
            loop {
                let job = { job_rx.lock().await.recv().await };
                let Some(job) = job else { break };

                if slip_tx.send(calculate_pay(&job)).await.is_err() {
                    // The consumer dropped its receiver: the run is already
                    // failing, stop computing.
                    break;
                }
            }
        }));
    }
    drop(slip_tx);

    let producer = tokio::spawn(async move {
        for job in jobs {
            if job_tx.send(job).await.is_err() {
                break;
            }
        }
    });

    let mut total_salary_paid = 0.0_f64;
    let mut payslip_count = 0_usize;
    let mut store_error: Option<AppError> = None;

    while let Some(payslip) = slip_rx.recv().await {
        match payslip_repo::insert_payslip(tx, &payslip).await {
            Ok(()) => {
                total_salary_paid += payslip.take_home_pay;
                payslip_count += 1;
            }
            Err(err) => {
                log::error!(
                    "Failed to store payslip for {}: {}",
                    payslip.employee_id,
                    err
                );
                store_error = Some(err.into());
                break;
            }
        }
    }
    drop(slip_rx);

    let mut join_error: Option<AppError> = None;
    for handle in handles.into_iter().chain(std::iter::once(producer)) {
        if let Err(err) = handle.await {
            log::error!("Payroll worker failed: {}", err);
            join_error.get_or_insert_with(|| {
                AppError::internal_server_error_message(format!(
                    "payroll worker failed: {}",
                    err
                ))
            });
        }
    }

    if let Some(err) = store_error.or(join_error) {
        return Err(err);
    }

    Ok((total_salary_paid, payslip_count))
}

/// Aggregation pipeline: four reads on the run's transaction, merged into
/// one record per employee with any activity in the period.
async fn build_calculation_data(
    tx: &mut Transaction<'_, Sqlite>,
    period: &PayrollPeriod,
) -> Result<Vec<PayrollCalculationData>, AppError> {
    let attendances =
        attendance_repo::attendance_counts_by_period(&mut **tx, period.start_date, period.end_date)
            .await?;
    let overtimes =
        attendance_repo::overtime_sums_by_period(&mut **tx, period.start_date, period.end_date)
            .await?;
    let reimbursements =
        attendance_repo::reimbursements_by_period(&mut **tx, period.start_date, period.end_date)
            .await?;

    let (mut aggregates, employee_ids) =
        merge_facts(period, attendances, overtimes, reimbursements);

    let salaries = user_repo::salaries_by_ids(&mut **tx, &employee_ids).await?;
    apply_salaries(&mut aggregates, &salaries);

    Ok(employee_ids
        .into_iter()
        .filter_map(|id| aggregates.remove(&id))
        .collect())
}

/// Merge the three fact streams keyed by employee id, in deterministic
/// order: attendance seeds the active set, overtime and reimbursements add
/// or update. Employees with a salary but no activity never enter the map,
/// so they generate no payslip.
fn merge_facts(
    period: &PayrollPeriod,
    attendances: Vec<AttendanceCount>,
    overtimes: Vec<OvertimeSum>,
    reimbursements: Vec<ReimbursementRecord>,
) -> (HashMap<Uuid, PayrollCalculationData>, Vec<Uuid>) {
    let mut aggregates: HashMap<Uuid, PayrollCalculationData> = HashMap::new();
    let mut employee_ids: Vec<Uuid> = Vec::new();

    let base = |employee_id: Uuid| PayrollCalculationData {
        employee_id,
        payroll_period_id: period.id,
        total_working_days: period.total_working_days,
        ..Default::default()
    };

    for attendance in attendances {
        let entry = aggregates
            .entry(attendance.employee_id)
            .or_insert_with(|| {
                employee_ids.push(attendance.employee_id);
                base(attendance.employee_id)
            });
        entry.attendance_days = attendance.days;
    }

    for overtime in overtimes {
        let entry = aggregates.entry(overtime.employee_id).or_insert_with(|| {
            employee_ids.push(overtime.employee_id);
            base(overtime.employee_id)
        });
        entry.overtime_hours = overtime.hours;
    }

    for reimbursement in reimbursements {
        let entry = aggregates
            .entry(reimbursement.employee_id)
            .or_insert_with(|| {
                employee_ids.push(reimbursement.employee_id);
                base(reimbursement.employee_id)
            });
        entry.reimbursements.push(ReimbursementEntry {
            id: reimbursement.id,
            amount: reimbursement.amount,
            description: reimbursement.description,
        });
    }

    (aggregates, employee_ids)
}

fn apply_salaries(aggregates: &mut HashMap<Uuid, PayrollCalculationData>, salaries: &[UserSalary]) {
    for salary in salaries {
        if let Some(entry) = aggregates.get_mut(&salary.id) {
            entry.salary = salary.salary;
        }
    }
}

/// Pure pay calculation, no I/O:
/// prorated salary + overtime pay + reimbursement total. All money math in
/// f64, rounding deferred to the storage column.
pub fn calculate_pay(data: &PayrollCalculationData) -> Payslip {
    let (prorated_salary, hourly_rate) = if data.total_working_days > 0 {
        let working_days = data.total_working_days as f64;
        (
            (data.attendance_days as f64 / working_days) * data.salary,
            data.salary / working_days / HOURS_PER_WORKING_DAY,
        )
    } else {
        (0.0, 0.0)
    };

    let overtime_pay = hourly_rate * data.overtime_hours as f64;
    let total_reimbursement: f64 = data.reimbursements.iter().map(|r| r.amount).sum();

    Payslip {
        id: Uuid::new_v4(),
        employee_id: data.employee_id,
        payroll_period_id: data.payroll_period_id,
        base_salary: data.salary,
        attendance_days: data.attendance_days,
        total_working_days: data.total_working_days,
        overtime_hours: data.overtime_hours,
        overtime_pay,
        reimbursements: data.reimbursements.clone(),
        total_reimbursement,
        take_home_pay: prorated_salary + overtime_pay + total_reimbursement,
        created_at: Utc::now(),
    }
}

/// Business days (Mon-Fri) in the inclusive range, computed by normalizing
/// both bounds to their preceding Monday, counting whole weeks at five days
/// each, and adding the partial-week remainder at each end capped at five.
pub fn count_working_days(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return 0;
    }

    let start_offset = i64::from(start.weekday().num_days_from_monday());
    let end_offset = i64::from(end.weekday().num_days_from_monday());

    let start_monday = start - Duration::days(start_offset);
    let end_monday = end - Duration::days(end_offset);

    let weeks = end_monday.signed_duration_since(start_monday).num_days() / 7;

    weeks * 5 - start_offset.min(5) + (end_offset + 1).min(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Weekday;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weekdays_between(mut start: NaiveDate, end: NaiveDate) -> i64 {
        let mut count = 0;
        while start <= end {
            if !matches!(start.weekday(), Weekday::Sat | Weekday::Sun) {
                count += 1;
            }
            start += Duration::days(1);
        }
        count
    }

    fn test_period(total_working_days: i64) -> PayrollPeriod {
        PayrollPeriod {
            id: Uuid::new_v4(),
            start_date: date(2025, 6, 1),
            end_date: date(2025, 6, 30),
            total_working_days,
            active: true,
            processed: false,
            total_salary_paid: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn working_days_full_month() {
        // June 2024 starts on a Saturday and holds exactly 20 weekdays.
        assert_eq!(count_working_days(date(2024, 6, 1), date(2024, 6, 30)), 20);
    }

    #[test]
    fn working_days_single_week() {
        assert_eq!(count_working_days(date(2025, 6, 2), date(2025, 6, 6)), 5);
        assert_eq!(count_working_days(date(2025, 6, 4), date(2025, 6, 4)), 1);
    }

    #[test]
    fn working_days_weekend_only() {
        assert_eq!(count_working_days(date(2025, 6, 7), date(2025, 6, 8)), 0);
    }

    #[test]
    fn working_days_matches_weekday_count() {
        let base = date(2024, 1, 1);
        for start_offset in 0..14 {
            for len in 0..60 {
                let start = base + Duration::days(start_offset);
                let end = start + Duration::days(len);
                assert_eq!(
                    count_working_days(start, end),
                    weekdays_between(start, end),
                    "range {} to {}",
                    start,
                    end
                );
            }
        }
    }

    #[test]
    fn calculate_pay_worked_example() {
        let period = test_period(20);
        let data = PayrollCalculationData {
            employee_id: Uuid::new_v4(),
            payroll_period_id: period.id,
            total_working_days: 20,
            attendance_days: 20,
            overtime_hours: 8,
            reimbursements: vec![
                ReimbursementEntry {
                    id: Uuid::new_v4(),
                    amount: 500_000.0,
                    description: "travel".to_string(),
                },
                ReimbursementEntry {
                    id: Uuid::new_v4(),
                    amount: 25_000.0,
                    description: "meals".to_string(),
                },
            ],
            salary: 10_000_000.0,
        };

        let payslip = calculate_pay(&data);

        assert_eq!(payslip.base_salary, 10_000_000.0);
        assert_eq!(payslip.overtime_pay, 500_000.0);
        assert_eq!(payslip.total_reimbursement, 525_000.0);
        assert_eq!(payslip.take_home_pay, 11_025_000.0);
    }

    #[test]
    fn calculate_pay_reimbursement_only() {
        let data = PayrollCalculationData {
            employee_id: Uuid::new_v4(),
            payroll_period_id: Uuid::new_v4(),
            total_working_days: 22,
            attendance_days: 0,
            overtime_hours: 0,
            reimbursements: vec![ReimbursementEntry {
                id: Uuid::new_v4(),
                amount: 75_000.0,
                description: "parking".to_string(),
            }],
            salary: 8_000_000.0,
        };

        let payslip = calculate_pay(&data);

        assert_eq!(payslip.overtime_pay, 0.0);
        assert_eq!(payslip.take_home_pay, 75_000.0);
    }

    #[test]
    fn calculate_pay_is_deterministic() {
        let data = PayrollCalculationData {
            employee_id: Uuid::new_v4(),
            payroll_period_id: Uuid::new_v4(),
            total_working_days: 21,
            attendance_days: 17,
            overtime_hours: 2,
            reimbursements: Vec::new(),
            salary: 12_345_678.0,
        };

        let first = calculate_pay(&data);
        let second = calculate_pay(&data);

        assert_eq!(first.take_home_pay, second.take_home_pay);
        assert_eq!(first.overtime_pay, second.overtime_pay);
        assert_eq!(first.total_reimbursement, second.total_reimbursement);
    }

    #[test]
    fn randomized_totals_accumulate_exactly() {
        use rand::Rng;

        let mut rng = rand::rng();
        let period = test_period(20);

        let employees = rng.random_range(1..=1000);
        let mut jobs = Vec::with_capacity(employees);
        for _ in 0..employees {
            let reimbursements = (0..rng.random_range(0..3))
                .map(|_| ReimbursementEntry {
                    id: Uuid::new_v4(),
                    amount: rng.random_range(1_000.0..500_000.0),
                    description: "expense".to_string(),
                })
                .collect();

            jobs.push(PayrollCalculationData {
                employee_id: Uuid::new_v4(),
                payroll_period_id: period.id,
                total_working_days: period.total_working_days,
                attendance_days: rng.random_range(0..=20),
                overtime_hours: rng.random_range(0..=3),
                reimbursements,
                salary: rng.random_range(3_000_000.0..20_000_000.0),
            });
        }

        let payslips: Vec<Payslip> = jobs.iter().map(calculate_pay).collect();

        let mut running_total = 0.0_f64;
        for payslip in &payslips {
            running_total += payslip.take_home_pay;
        }
        let summed: f64 = payslips.iter().map(|p| p.take_home_pay).sum();

        assert!((running_total - summed).abs() < 1e-6);
    }

    #[test]
    fn merge_seeds_from_attendance_then_updates() {
        let period = test_period(20);
        let worker = Uuid::new_v4();
        let night_owl = Uuid::new_v4();

        let attendances = vec![AttendanceCount {
            employee_id: worker,
            days: 18,
        }];
        let overtimes = vec![
            OvertimeSum {
                employee_id: worker,
                hours: 4,
            },
            OvertimeSum {
                employee_id: night_owl,
                hours: 2,
            },
        ];
        let reimbursements = vec![ReimbursementRecord {
            id: Uuid::new_v4(),
            employee_id: worker,
            amount: 10_000.0,
            description: "taxi".to_string(),
            created_at: Utc::now(),
        }];

        let (aggregates, employee_ids) =
            merge_facts(&period, attendances, overtimes, reimbursements);

        assert_eq!(employee_ids, vec![worker, night_owl]);

        let worker_data = &aggregates[&worker];
        assert_eq!(worker_data.attendance_days, 18);
        assert_eq!(worker_data.overtime_hours, 4);
        assert_eq!(worker_data.reimbursements.len(), 1);

        let night_owl_data = &aggregates[&night_owl];
        assert_eq!(night_owl_data.attendance_days, 0);
        assert_eq!(night_owl_data.overtime_hours, 2);
        assert!(night_owl_data.reimbursements.is_empty());
    }

    #[test]
    fn salaries_only_update_active_employees() {
        let period = test_period(20);
        let active = Uuid::new_v4();
        let inactive = Uuid::new_v4();

        let (mut aggregates, employee_ids) = merge_facts(
            &period,
            vec![AttendanceCount {
                employee_id: active,
                days: 10,
            }],
            Vec::new(),
            Vec::new(),
        );

        apply_salaries(
            &mut aggregates,
            &[
                UserSalary {
                    id: active,
                    salary: 5_000_000.0,
                },
                UserSalary {
                    id: inactive,
                    salary: 9_000_000.0,
                },
            ],
        );

        assert_eq!(employee_ids, vec![active]);
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[&active].salary, 5_000_000.0);
    }
}
