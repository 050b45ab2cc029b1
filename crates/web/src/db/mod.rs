//! Database operations for the `PostgreSQL` backing store.
//!
//! # Tables
//!
//! - `users` - One row per identity-provider user, written by the
//!   account-provisioning webhook
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p agentbi-cli -- migrate
//! ```

pub mod accounts;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use agentbi_core::AccountRecord;

pub use accounts::PgAccountRepository;
pub use memory::MemoryAccountStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Created,
    /// A row with the same key already existed; nothing was written.
    AlreadyExists,
}

/// Storage for provisioned accounts.
///
/// Inserts must be idempotent: repeating an insert for an existing
/// [`AccountRecord::id`] reports [`InsertOutcome::AlreadyExists`] instead of
/// failing, because the event source redelivers on any non-2xx response.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert an account unless one with the same ID exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store rejects or cannot perform the write.
    async fn insert_account(&self, account: &AccountRecord)
    -> Result<InsertOutcome, RepositoryError>;

    /// Check that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if it is not.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
