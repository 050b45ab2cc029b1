//! In-memory account store.
//!
//! Used by tests and local tooling where `PostgreSQL` is not available. It
//! honours the same idempotency contract as [`super::PgAccountRepository`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use agentbi_core::{AccountId, AccountRecord};

use super::{AccountStore, InsertOutcome, RepositoryError};

/// Account store holding rows in a map keyed by account ID.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    rows: Mutex<BTreeMap<AccountId, AccountRecord>>,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryAccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the store were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of all rows, ordered by ID.
    #[must_use]
    pub fn accounts(&self) -> Vec<AccountRecord> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn get(&self, id: &AccountId) -> Option<AccountRecord> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Number of insert attempts that reached the store.
    #[must_use]
    pub fn write_attempts(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn insert_account(
        &self,
        account: &AccountRecord,
    ) -> Result<InsertOutcome, RepositoryError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        if rows.contains_key(&account.id) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        rows.insert(account.id.clone(), account.clone());
        Ok(InsertOutcome::Created)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check_available()
    }
}
