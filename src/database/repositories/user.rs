use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::database::models::{User, UserRole, UserSalary};

/// Authorization check: whether the acting user holds the admin role.
/// Unknown users are not administrators.
pub async fn is_admin(pool: &SqlitePool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let role = sqlx::query_scalar::<_, UserRole>(
        r#"
        SELECT role FROM users WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(role == Some(UserRole::Admin))
}

/// Base-salary snapshots for the given employee-id set, in one query.
pub async fn salaries_by_ids<'e, E>(
    executor: E,
    employee_ids: &[Uuid],
) -> Result<Vec<UserSalary>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    if employee_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; employee_ids.len()].join(", ");
    let query = format!(
        "SELECT id, salary FROM users WHERE id IN ({})",
        placeholders
    );

    let mut q = sqlx::query_as::<_, UserSalary>(&query);
    for id in employee_ids {
        q = q.bind(id);
    }

    q.fetch_all(executor).await
}

pub async fn create_user(pool: &SqlitePool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, salary, role, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(user.salary)
    .bind(user.role)
    .bind(user.created_at)
    .execute(pool)
    .await?;

    Ok(())
}
