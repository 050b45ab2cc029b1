//! Account records provisioned from identity-provider events.

use serde::{Deserialize, Serialize};

use super::id::AccountId;

/// A local account row mirroring an identity-provider user.
///
/// Created at most once per [`AccountId`]; never updated or deleted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Identity-provider user ID.
    pub id: AccountId,
    /// Primary email address, empty when the provider sent none.
    pub email: String,
}

impl AccountRecord {
    #[must_use]
    pub fn new(id: impl Into<AccountId>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}
