use crate::error::{Error, Result};
use crate::models::user::{is_assignable_role, User, ROLE_STUDENT};
use crate::utils::crypto::{hash_password, verify_password};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> Result<User> {
        let role = match role {
            Some(r) if is_assignable_role(r) => r,
            Some(r) => {
                return Err(Error::BadRequest(format!("Role '{}' cannot be assigned", r)))
            }
            None => ROLE_STUDENT,
        };

        let email = email.trim().to_lowercase();
        let existing = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM users WHERE email = $1"#,
        )
        .bind(&email)
        .fetch_one(&self.pool)
        .await?;
        if existing > 0 {
            return Err(Error::BadRequest("Email already in use".to_string()));
        }

        let password_hash = hash_password(password)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(username.trim())
        .bind(&email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            // Losing a registration race hits the unique index, not the
            // COUNT check above.
            sqlx::Error::Database(db) if db.constraint() == Some("users_email_key") => {
                Error::BadRequest("Email already in use".to_string())
            }
            _ => Error::from(e),
        })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Credential check for login. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<User> {
        let invalid = || Error::Unauthorized("Invalid email or password".to_string());

        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE email = $1"#)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(invalid)?;

        let ok = verify_password(password, &user.password_hash)
            .map_err(|e| Error::Internal(format!("Failed to verify password: {}", e)))?;
        if !ok {
            return Err(invalid());
        }
        Ok(user)
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }
}
