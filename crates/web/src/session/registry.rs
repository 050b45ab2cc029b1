//! Live tab sessions, keyed by tab ID.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use agentbi_core::AccountId;

use super::{FileContext, SessionError};
use crate::config::TabSessionConfig;
use crate::views::{ChatView, UploadIntake};

/// Identifies one open browser tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(Uuid);

impl TabId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TabId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// State of one tab: the staged files and both views.
///
/// Lock order is view first, then files. The file lock is only held inside
/// a single [`FileContext`] call.
#[derive(Debug)]
pub struct TabSession {
    owner: AccountId,
    pub files: FileContext,
    upload: Mutex<UploadIntake>,
    chat: Mutex<ChatView>,
}

impl TabSession {
    fn new(owner: AccountId) -> Self {
        Self {
            owner,
            files: FileContext::new(),
            upload: Mutex::new(UploadIntake::new()),
            chat: Mutex::new(ChatView::new()),
        }
    }

    #[must_use]
    pub const fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// Lock the upload view for one operation.
    pub fn upload(&self) -> MutexGuard<'_, UploadIntake> {
        self.upload.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the chat view for one operation.
    pub fn chat(&self) -> MutexGuard<'_, ChatView> {
        self.chat.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// All live tab sessions.
///
/// Cheap to clone. Sessions expire after the configured idle time and the
/// least recently used are evicted past capacity.
#[derive(Clone)]
pub struct SessionRegistry {
    tabs: Cache<TabId, Arc<TabSession>>,
    max_upload_bytes: usize,
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("live_tabs", &self.tabs.entry_count())
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl SessionRegistry {
    #[must_use]
    pub fn new(config: TabSessionConfig) -> Self {
        let tabs = Cache::builder()
            .max_capacity(config.capacity)
            .time_to_idle(config.idle_timeout)
            .build();
        Self {
            tabs,
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Body limit for requests that carry files into a session.
    #[must_use]
    pub const fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Start a fresh, empty session for a page load.
    ///
    /// A reload names the tab it replaces in `supersedes`; that session is
    /// dropped if `owner` holds it. Anything else there is ignored.
    pub fn open(&self, owner: AccountId, supersedes: Option<TabId>) -> (TabId, Arc<TabSession>) {
        if let Some(old) = supersedes.filter(|old| self.get(old, &owner).is_ok()) {
            self.tabs.invalidate(&old);
            debug!(tab_id = %old, "Dropped superseded tab session");
        }

        let id = TabId::new();
        let session = Arc::new(TabSession::new(owner));
        self.tabs.insert(id, session.clone());
        debug!(tab_id = %id, owner = %session.owner, "Opened tab session");
        (id, session)
    }

    /// Look up a live session owned by `owner`.
    ///
    /// Another account's tab is reported as not found.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` if no such session is live for `owner`.
    pub fn get(&self, id: &TabId, owner: &AccountId) -> Result<Arc<TabSession>, SessionError> {
        self.tabs
            .get(id)
            .filter(|session| session.owner == *owner)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }
}
