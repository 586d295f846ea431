use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::{NewUser, User};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, avatar, confirmed, role, created_at";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_id(&self, user_id: i32) -> Result<Option<User>, AppError>;

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Inserts the user. A duplicate username or e-mail is `AppError::Conflict`.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Marks the address as confirmed. Returns `false` when no user has that e-mail.
    async fn confirm_email(&self, email: &str) -> Result<bool, AppError>;

    async fn update_avatar(&self, user_id: i32, url: &str) -> Result<Option<User>, AppError>;
}

/// `UserRepository` over PostgreSQL.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_by_id(&self, user_id: i32) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.fetch_one_by("username", username).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.fetch_one_by("email", email).await
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, avatar, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.avatar)
            .bind(new_user.role)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn confirm_email(&self, email: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET confirmed = TRUE WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_avatar(&self, user_id: i32, url: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "UPDATE users SET avatar = $1 WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(url)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}
