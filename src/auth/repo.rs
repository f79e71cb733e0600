use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::repo_types::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    ConstraintViolation,
    #[error("user not found")]
    NotFound,
    #[error("database unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            return Self::ConstraintViolation;
        }
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            ref e @ (sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed) => Self::Unavailable(e.to_string()),
            other => Self::Database(other),
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// Persistence for user records. Implementations must be safe to share across requests.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and return the stored row, including store-assigned fields.
    async fn create_user(&self, new_user: NewUser<'_>) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, new_user: NewUser<'_>) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password, first_name, last_name, bio)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password, first_name, last_name, bio, created_at, updated_at
            "#,
        )
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.bio)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password, first_name, last_name, bio, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        user.ok_or(StoreError::NotFound)
    }
}
