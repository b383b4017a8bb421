use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_INSTRUCTOR: &str = "instructor";
pub const ROLE_ADMIN: &str = "admin";

pub fn is_assignable_role(role: &str) -> bool {
    matches!(role, ROLE_STUDENT | ROLE_INSTRUCTOR)
}
