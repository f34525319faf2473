#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use payday::database::{
    init_database,
    models::{User, UserRole},
    repositories::user as user_repo,
};

// Test database wrapper
pub struct TestDb {
    pub pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let database_url = format!("sqlite:{}/test.db", temp_dir.path().display());
        let pool = init_database(&database_url).await?;

        Ok(TestDb {
            pool,
            _temp_dir: temp_dir,
        })
    }
}

pub async fn seed_user(
    pool: &SqlitePool,
    username: &str,
    salary: f64,
    role: UserRole,
) -> Result<Uuid> {
    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        salary,
        role,
        created_at: Utc::now(),
    };

    user_repo::create_user(pool, &user).await?;

    Ok(user.id)
}

/// A four-week Monday-to-Sunday window (20 working days) that always
/// contains today, so facts stamped with the current time land inside it.
pub fn test_period_bounds() -> (NaiveDate, NaiveDate) {
    let today = Utc::now().date_naive();
    let this_monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let start = this_monday - Duration::days(21);

    (start, start + Duration::days(27))
}

pub fn at_hour(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    date.and_hms_opt(hour, 0, 0).unwrap().and_utc()
}
