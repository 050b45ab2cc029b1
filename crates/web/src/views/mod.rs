//! View models for the two tab screens.
//!
//! Views hold only their own presentation state. The staged file set is
//! borrowed from the tab's [`FileContext`](crate::session::FileContext) per
//! operation, so both views always act on the same set.

pub mod chat;
pub mod upload;

pub use chat::{ChatSnapshot, ChatView, Key, SendOutcome, WARNING_TEXT};
pub use upload::{Navigation, UploadIntake};

use bytes::Bytes;
use tracing::debug;

use agentbi_core::StagedFile;

/// A file offered by the client, before the allow-list check.
#[derive(Clone)]
pub struct CandidateFile {
    pub name: String,
    /// MIME type as declared by the client.
    pub mime: String,
    pub content: Bytes,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            content: content.into(),
        }
    }
}

impl std::fmt::Debug for CandidateFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("size", &self.content.len())
            .finish()
    }
}

/// Keep the allow-listed candidates, in order. Others are dropped silently.
pub(crate) fn stage(candidates: Vec<CandidateFile>) -> Vec<StagedFile> {
    candidates
        .into_iter()
        .filter_map(|c| match StagedFile::accept(c.name, &c.mime, c.content) {
            Ok(file) => Some(file),
            Err(e) => {
                debug!(error = %e, "Dropped file outside the allow-list");
                None
            }
        })
        .collect()
}
