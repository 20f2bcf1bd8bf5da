//! Account repository and its PostgreSQL queries.

use async_trait::async_trait;
use sqlx::PgPool;

use super::AuthError;
use crate::models::auth::{Account, NewAccount};

/// Storage-layer failure (unreachable store, failed query).
pub type RepositoryError = sqlx::Error;

const ACCOUNT_COLUMNS: &str = "id, username, email, registration_date, edit_date, \
     password_hashed, enabled, activated";

/// Persistent account storage.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fetch an account by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AuthError>;

    /// Fetch all accounts registered with `email`.
    async fn find_by_email(&self, email: &str) -> Result<Vec<Account>, AuthError>;

    /// Insert a new account. Uniqueness is enforced by the store.
    async fn insert(&self, account: &NewAccount) -> Result<(), AuthError>;
}

/// `AccountRepository` over the `gridpulse.accounts` table.
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AuthError> {
        let row = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM gridpulse.accounts WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Account>, AuthError> {
        let rows = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM gridpulse.accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert(&self, account: &NewAccount) -> Result<(), AuthError> {
        sqlx::query(
            "INSERT INTO gridpulse.accounts \
             (username, email, registration_date, edit_date, password_hashed, auth_method, user_role) \
             VALUES ($1, $2, now(), now(), $3, $4, $5)",
        )
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.auth_method)
        .bind(&account.role)
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            // Lost a race with a concurrent registration.
            Some(db) if db.is_unique_violation() => AuthError::AccountExists,
            _ => AuthError::Repository(e),
        })?;
        Ok(())
    }
}
