//! Account repository backed by `PostgreSQL`.

use async_trait::async_trait;
use sqlx::PgPool;

use agentbi_core::AccountRecord;

use super::{AccountStore, InsertOutcome, RepositoryError};

/// Repository for the `users` table.
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountRepository {
    async fn insert_account(
        &self,
        account: &AccountRecord,
    ) -> Result<InsertOutcome, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO users (id, email)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(&account.id)
        .bind(&account.email)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Created)
        }
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
