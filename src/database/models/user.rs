use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Employee,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub salary: f64,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Salary snapshot used by the aggregation pipeline.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserSalary {
    pub id: Uuid,
    pub salary: f64,
}
